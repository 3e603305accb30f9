//! 关键词兜底路由：规则未命中时按固定优先级选择工具，永不失败

use serde_json::{json, Map};

use super::Route;
use crate::tools::{HTTP_TOOL, JSON_TOOL, PYTHON_TOOL};

const URL_SCHEMES: &[&str] = &["http://", "https://"];
const CODE_WORDS: &[&str] = &["python", "compute", "code"];

/// URL / fetch → http(GET)；python / compute / code → python；json → json；其余 → python
pub fn route(step: &str) -> Route {
    let s = step.to_lowercase();
    if URL_SCHEMES.iter().any(|p| s.contains(p)) || s.contains("fetch") {
        let mut params = Map::new();
        params.insert("method".to_string(), json!("GET"));
        return Route::new(HTTP_TOOL, params);
    }
    if CODE_WORDS.iter().any(|w| s.contains(w)) {
        return Route::new(PYTHON_TOOL, Map::new());
    }
    if s.contains("json") {
        return Route::new(JSON_TOOL, Map::new());
    }
    Route::new(PYTHON_TOOL, Map::new())
}
