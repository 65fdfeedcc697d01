pub mod av_transport;
pub mod rendering_control;
