use std::sync::Arc;

use haru_core::{IssueStore, VisionAnalyzer};
use haru_crawler::ScheduledCrawler;

pub struct AppState {
    pub store: Arc<dyn IssueStore>,
    pub crawler: Arc<ScheduledCrawler>,
    pub vision: Arc<dyn VisionAnalyzer>,
}
