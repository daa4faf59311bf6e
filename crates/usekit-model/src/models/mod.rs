//! Models of the configuration files usekit edits

pub mod pipelines;
pub mod precommit;
pub mod pyproject;
pub mod settings;

pub use pipelines::PipelinesConfiguration;
pub use precommit::PreCommitConfig;
pub use pyproject::ProjectSection;
pub use settings::UsekitSettings;
