#![allow(clippy::doc_markdown)]

pub mod built_info {
    use lazy_static::lazy_static;

    include!(concat!(env!("OUT_DIR"), "/built.rs"));

    lazy_static! {
        /// The package version, suffixed with the git commit hash (and `-dirty` for uncommitted
        /// changes) when built from a git checkout.
        pub static ref VERSION: String = {
            let prefix = match GIT_COMMIT_HASH {
                Some(hash) => format!("{PKG_VERSION}-{}", &hash[..hash.len().min(7)]),
                None => PKG_VERSION.to_string(),
            };
            match GIT_DIRTY {
                Some(true) => format!("{prefix}-dirty"),
                _ => prefix,
            }
        };
    }
}
