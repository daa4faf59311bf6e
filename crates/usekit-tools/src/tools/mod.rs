//! The tool catalogue

pub mod bitbucket;
pub mod codespell;
pub mod coverage;
pub mod deptry;
pub mod pre_commit;
pub mod pyproject_fmt;
pub mod pytest;
pub mod ruff;

pub use bitbucket::BitbucketPipelines;
pub use codespell::Codespell;
pub use coverage::Coverage;
pub use deptry::Deptry;
pub use pre_commit::PreCommit;
pub use pyproject_fmt::PyprojectFmt;
pub use pytest::Pytest;
pub use ruff::Ruff;
