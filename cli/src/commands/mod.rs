mod gitops;

pub use self::gitops::{handle_catalog, handle_resolve};
