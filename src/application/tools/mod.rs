mod random_video;
pub use random_video::extract_video_id;
pub use random_video::RandomVideo;
pub use random_video::RANDOM_VIDEO_URL;
