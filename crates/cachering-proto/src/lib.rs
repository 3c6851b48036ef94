//! Generated gRPC transport types for the cache service (§6).
//!
//! `tonic_build::compile_protos` writes the generated module into
//! `OUT_DIR` at build time from `proto/cachering.proto` — nothing here is
//! checked in, matching `examples/agourakis82-beagle`'s `beagle-grpc`
//! crate's use of `tonic-build` as a build-dependency.

pub mod generated {
    include!(concat!(env!("OUT_DIR"), "/cachering.v1.rs"));
}

pub use generated::*;
pub use tonic;
