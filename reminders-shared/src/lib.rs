pub mod api;
pub mod domain;
pub mod manifest;
pub mod relay;
