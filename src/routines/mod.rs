// Routines for coarsening
pub mod coarsening;
// Routines for grid generation
pub mod generation;
// Routines for the nodal/surplus transform
pub mod hierarchization;
// Routines for refinement
pub mod refinement;
// Routines for settings
pub mod settings;
