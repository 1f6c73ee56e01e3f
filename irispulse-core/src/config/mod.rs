mod emitter_config;
mod world_desc;

pub use emitter_config::EmitterConfig;
pub use world_desc::IrisPulseWorldDesc;
