mod document;
mod helpers;
mod video;
