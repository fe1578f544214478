pub mod centroid;
pub mod color_matcher;
pub mod fusion;
pub mod motion_filter;
pub mod pixel;
pub mod score_map;
pub mod search_window;
pub mod shape_filter;
pub mod window_color_map;
