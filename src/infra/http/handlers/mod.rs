mod assessors;
mod participants;
mod regions;

pub use assessors::{get_assessor, list_assessors};
pub use participants::{
    create_participant, get_participant, list_participants, list_ready, list_unassessed,
};
pub use regions::{list_provinces, list_regencies};
