//! Per-marketplace card parsers

mod freelancer;
mod freemoa;
mod guru;
mod upwork;
mod wishket;

pub use freelancer::FreelancerParser;
pub use freemoa::FreemoaParser;
pub use guru::GuruParser;
pub use upwork::UpworkParser;
pub use wishket::WishketParser;
