//! Planner：把自由文本任务切分为有序步骤
//!
//! 以 `.`、`;`、换行为分隔符，去除首尾空白并丢弃空段；若切分结果为空，整个任务作为唯一步骤。

const DELIMITERS: &[char] = &['.', ';', '\n'];

/// 切分任务为步骤列表（纯函数，保序，至少返回一个步骤）
pub fn plan(task: &str) -> Vec<String> {
    let steps: Vec<String> = task
        .split(DELIMITERS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if steps.is_empty() {
        vec![task.to_string()]
    } else {
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_all_delimiters() {
        assert_eq!(plan("a. b; c\nd"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_drops_empty_segments() {
        assert_eq!(plan(" ;; first ..\n\n second ; "), vec!["first", "second"]);
    }

    #[test]
    fn test_empty_task_is_single_step() {
        assert_eq!(plan(""), vec![""]);
        assert_eq!(plan(" ;. "), vec![" ;. "]);
    }

    #[test]
    fn test_no_delimiter() {
        assert_eq!(plan("python result = 2 + 3"), vec!["python result = 2 + 3"]);
    }
}
