use std::sync::Arc;

use crate::application::sources::{AssessorSource, ParticipantSource, RegionSource};
use crate::cache::CacheState;

#[derive(Clone)]
pub struct AppState {
    pub participants: Arc<dyn ParticipantSource>,
    pub assessors: Arc<dyn AssessorSource>,
    pub regions: Arc<dyn RegionSource>,
    pub cache: CacheState,
}
