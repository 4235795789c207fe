use std::sync::Arc;

use pipeline::MutationPipeline;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) pipeline: Arc<MutationPipeline>,
    pub(crate) max_body_bytes: usize,
}
