//! Offline processing of collected postings: skills, role categories,
//! locations and posting dates.

mod location;
mod pipeline;
mod posted;
mod skills;
mod taxonomy;
mod text;
mod titles;

pub use pipeline::run;
pub use skills::TextField;
