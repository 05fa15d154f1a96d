//! Small numerical primitives for SCPN Multipac.

pub mod filter;
pub mod least_squares;
pub mod linalg;
pub mod polyfit;
