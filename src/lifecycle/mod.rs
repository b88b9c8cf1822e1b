pub mod artifact_manager;

pub use artifact_manager::{
    release, ArtifactManager, ArtifactStore, CommitOutcome, ReleaseOutcome, ReleasePolicy,
};
