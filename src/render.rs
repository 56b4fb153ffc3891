pub mod blit;
pub mod text;
