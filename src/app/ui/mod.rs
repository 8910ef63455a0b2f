mod controls;
mod details;
mod panels;
mod resize;

pub(in crate::app) use resize::EguiCapture;
