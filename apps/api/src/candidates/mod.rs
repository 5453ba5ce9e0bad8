// Candidate pool API: listing, saving and resume uploads.
// Storage lives behind `store::CandidateStore`; parsing in `resume_parser`.

pub mod handlers;
