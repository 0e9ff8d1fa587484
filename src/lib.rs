pub mod age;
pub mod github;
pub mod stats;
pub mod svg;
