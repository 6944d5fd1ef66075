//! Appending this tool to the program chain (`@PG` records) of a SAM header.
use anyhow::Result;
use bstr::BString;
use noodles::sam::{
    header::record::value::{
        map::{program::tag, Program},
        Map,
    },
    Header,
};
use std::collections::HashSet;

/// Describes the invocation of this tool, to be recorded in the output header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramInfo {
    /// The preferred `@PG` ID (made unique if already taken).
    pub id: String,
    /// The program name (`PN`).
    pub name: String,
    /// The program version (`VN`).
    pub version: String,
    /// The full command line (`CL`).
    pub command_line: String,
}

/// Returns the ID of the last program in the `@PG` chain, i.e. the program that no other program
/// names as its previous program (`PP`).  Returns `None` if the header has no programs.
pub fn last_program_id(header: &Header) -> Option<BString> {
    let programs = header.programs();
    let programs = programs.as_ref();

    let referenced: HashSet<&[u8]> = programs
        .values()
        .filter_map(|pg| pg.other_fields().get(&tag::PREVIOUS_PROGRAM_ID))
        .map(|pp| pp.as_slice())
        .collect();

    programs
        .keys()
        .rev()
        .find(|id| !referenced.contains(id.as_slice()))
        .or_else(|| programs.keys().last())
        .cloned()
}

/// Returns `base_id` if no program in the header uses it, otherwise the first of `base_id.1`,
/// `base_id.2`, ... that is free.
pub fn unique_program_id(header: &Header, base_id: &str) -> BString {
    let programs = header.programs();
    let programs = programs.as_ref();
    if !programs.contains_key(base_id.as_bytes()) {
        return BString::from(base_id);
    }
    (1_usize..)
        .map(|i| format!("{base_id}.{i}"))
        .find(|candidate| !programs.contains_key(candidate.as_bytes()))
        .map(BString::from)
        .unwrap_or_else(|| BString::from(base_id))
}

/// Appends a `@PG` record describing `program` to the end of the header's program chain, linking
/// it to the previous last program via `PP`.
///
/// Empty fields are left out; SAM does not allow empty tag values.
pub fn append_program(mut header: Header, program: &ProgramInfo) -> Result<Header> {
    let previous = last_program_id(&header);
    let id = unique_program_id(&header, &program.id);

    let mut builder = Map::<Program>::builder();
    for (key, value) in [
        (tag::NAME, &program.name),
        (tag::VERSION, &program.version),
        (tag::COMMAND_LINE, &program.command_line),
    ] {
        if !value.is_empty() {
            builder = builder.insert(key, value.as_str());
        }
    }
    if let Some(previous) = previous {
        builder = builder.insert(tag::PREVIOUS_PROGRAM_ID, previous);
    }

    header.programs_mut().add(id, builder.build()?)?;
    Ok(header)
}
