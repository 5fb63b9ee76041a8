pub mod hash;
pub mod html;
pub mod ids;
pub mod jwt;
pub mod validation;
