//! Pure tool -> tracker-activity mappers.
//!
//! One row per known tool name; unknown names yield `None` and the
//! projector emits nothing for them. A plain `&'static str -> fn`
//! dispatch table is enough here — no trait hierarchy needed for
//! stateless, input-in/output-out mappers.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedAction {
    pub action: String,
    pub parameter: String,
    pub result: Option<String>,
}

type Mapper = fn(&Value, Option<&str>) -> Option<MappedAction>;

const TABLE: &[(&str, Mapper)] = &[
    ("Bash", map_bash),
    ("Edit", map_edit),
    ("Write", map_write),
    ("Read", map_read),
    ("Glob", map_glob),
    ("Grep", map_grep),
    ("Task", map_task),
    ("WebFetch", map_web_fetch),
    ("WebSearch", map_web_search),
    ("TaskCreate", map_task_create),
    ("TaskUpdate", map_task_update),
    ("Skill", map_skill),
    ("AskUserQuestion", map_ask_user_question),
    ("NotebookEdit", map_notebook_edit),
];

/// Look up and invoke the mapper for `tool_name`, if one is registered.
/// `result_text` is `None` when mapping a fresh `tool_use` (no result
/// yet) and `Some` when mapping a completed `tool_result`.
pub fn map_tool(tool_name: &str, input: &Value, result_text: Option<&str>) -> Option<MappedAction> {
    TABLE
        .iter()
        .find(|(name, _)| *name == tool_name)
        .and_then(|(_, mapper)| mapper(input, result_text))
}

fn str_field(input: &Value, field: &str) -> String {
    input
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn git_diff_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^git\s+diff\b").unwrap())
}

fn agent_id_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^agentId:.*\n?").unwrap())
}

fn usage_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<usage>.*?</usage>").unwrap())
}

fn map_bash(input: &Value, result_text: Option<&str>) -> Option<MappedAction> {
    let command = str_field(input, "command");
    let result = result_text.map(|r| {
        if git_diff_re().is_match(command.trim_start()) {
            format!("```diff\n{r}\n```")
        } else if serde_json::from_str::<Value>(r).is_ok() {
            format!("```json\n{r}\n```")
        } else {
            r.to_string()
        }
    });
    Some(MappedAction {
        action: "Ran command".into(),
        parameter: command,
        result,
    })
}

fn map_edit(input: &Value, _result_text: Option<&str>) -> Option<MappedAction> {
    let file_path = str_field(input, "file_path");
    let old = str_field(input, "old_string");
    let new = str_field(input, "new_string");

    let result = if old.is_empty() && new.is_empty() {
        None
    } else {
        let mut body = String::new();
        for line in old.lines() {
            body.push_str("- ");
            body.push_str(line);
            body.push('\n');
        }
        for line in new.lines() {
            body.push_str("+ ");
            body.push_str(line);
            body.push('\n');
        }
        Some(format!("```diff\n{body}```"))
    };

    Some(MappedAction {
        action: "Edited file".into(),
        parameter: file_path,
        result,
    })
}

fn map_write(input: &Value, _result_text: Option<&str>) -> Option<MappedAction> {
    Some(MappedAction {
        action: "Created file".into(),
        parameter: str_field(input, "file_path"),
        result: None,
    })
}

fn map_read(input: &Value, _result_text: Option<&str>) -> Option<MappedAction> {
    Some(MappedAction {
        action: "Read file".into(),
        parameter: str_field(input, "file_path"),
        result: None,
    })
}

fn map_glob(input: &Value, result_text: Option<&str>) -> Option<MappedAction> {
    let pattern = str_field(input, "pattern");
    let path = str_field(input, "path");
    let parameter = if path.is_empty() {
        pattern
    } else {
        format!("{pattern} in {path}")
    };
    Some(MappedAction {
        action: "Searched files".into(),
        parameter,
        result: result_text.map(str::to_string),
    })
}

fn map_grep(input: &Value, result_text: Option<&str>) -> Option<MappedAction> {
    let mut parameter = str_field(input, "pattern");
    let path = str_field(input, "path");
    let glob = str_field(input, "glob");
    if !path.is_empty() {
        parameter.push_str(" in ");
        parameter.push_str(&path);
    }
    if !glob.is_empty() {
        parameter.push_str(" (");
        parameter.push_str(&glob);
        parameter.push(')');
    }
    Some(MappedAction {
        action: "Searched for pattern".into(),
        parameter,
        result: result_text.map(str::to_string),
    })
}

fn map_task(input: &Value, result_text: Option<&str>) -> Option<MappedAction> {
    let description = str_field(input, "description");
    let result = result_text.and_then(|r| {
        let cleaned = agent_id_line_re().replace_all(r, "");
        let cleaned = usage_block_re().replace_all(&cleaned, "");
        let trimmed = cleaned.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    });
    Some(MappedAction {
        action: "Delegated subtask".into(),
        parameter: description,
        result,
    })
}

fn map_web_fetch(input: &Value, result_text: Option<&str>) -> Option<MappedAction> {
    Some(MappedAction {
        action: "Fetched URL".into(),
        parameter: str_field(input, "url"),
        result: result_text.map(str::to_string),
    })
}

fn map_web_search(input: &Value, _result_text: Option<&str>) -> Option<MappedAction> {
    Some(MappedAction {
        action: "Web search".into(),
        parameter: str_field(input, "query"),
        result: None,
    })
}

fn map_task_create(input: &Value, _result_text: Option<&str>) -> Option<MappedAction> {
    Some(MappedAction {
        action: "Created task".into(),
        parameter: str_field(input, "subject"),
        result: None,
    })
}

fn map_task_update(input: &Value, _result_text: Option<&str>) -> Option<MappedAction> {
    Some(MappedAction {
        action: "Updated task".into(),
        parameter: str_field(input, "taskId"),
        result: None,
    })
}

fn map_skill(input: &Value, _result_text: Option<&str>) -> Option<MappedAction> {
    Some(MappedAction {
        action: "Invoked skill".into(),
        parameter: str_field(input, "skill"),
        result: None,
    })
}

fn map_ask_user_question(input: &Value, _result_text: Option<&str>) -> Option<MappedAction> {
    let question = input
        .get("questions")
        .and_then(Value::as_array)
        .and_then(|questions| questions.first())
        .and_then(|q| q.get("question"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    Some(MappedAction {
        action: "Asked user".into(),
        parameter: question,
        result: None,
    })
}

fn map_notebook_edit(input: &Value, _result_text: Option<&str>) -> Option<MappedAction> {
    Some(MappedAction {
        action: "Edited notebook".into(),
        parameter: str_field(input, "notebook_path"),
        result: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_tool_maps_to_none() {
        assert!(map_tool("NotARealTool", &json!({}), None).is_none());
    }

    #[test]
    fn bash_git_diff_result_is_fenced_as_diff() {
        let input = json!({ "command": "git diff HEAD~1" });
        let mapped = map_tool("Bash", &input, Some("+added\n-removed")).unwrap();
        assert_eq!(mapped.action, "Ran command");
        assert_eq!(mapped.parameter, "git diff HEAD~1");
        assert_eq!(mapped.result.unwrap(), "```diff\n+added\n-removed\n```");
    }

    #[test]
    fn bash_json_result_is_fenced_as_json() {
        let input = json!({ "command": "cat config.json" });
        let mapped = map_tool("Bash", &input, Some(r#"{"a":1}"#)).unwrap();
        assert_eq!(mapped.result.unwrap(), "```json\n{\"a\":1}\n```");
    }

    #[test]
    fn bash_plain_result_is_verbatim() {
        let input = json!({ "command": "ls" });
        let mapped = map_tool("Bash", &input, Some("a.txt\nb.txt")).unwrap();
        assert_eq!(mapped.result.unwrap(), "a.txt\nb.txt");
    }

    #[test]
    fn bash_without_result_has_no_result() {
        let input = json!({ "command": "ls" });
        let mapped = map_tool("Bash", &input, None).unwrap();
        assert!(mapped.result.is_none());
    }

    #[test]
    fn edit_with_empty_strings_has_no_result() {
        let input = json!({ "file_path": "/f.rs", "old_string": "", "new_string": "" });
        let mapped = map_tool("Edit", &input, Some("ignored")).unwrap();
        assert!(mapped.result.is_none());
    }

    #[test]
    fn edit_produces_unified_diff_block() {
        let input = json!({ "file_path": "/f.rs", "old_string": "a", "new_string": "b" });
        let mapped = map_tool("Edit", &input, None).unwrap();
        assert_eq!(mapped.result.unwrap(), "```diff\n- a\n+ b\n```");
    }

    #[test]
    fn task_strips_agent_id_and_usage_block() {
        let input = json!({ "description": "subtask" });
        let raw = "agentId: abc-123\nSome real output\n<usage>tokens: 500</usage>";
        let mapped = map_tool("Task", &input, Some(raw)).unwrap();
        assert_eq!(mapped.result.unwrap(), "Some real output");
    }

    #[test]
    fn task_with_only_noise_has_no_result() {
        let input = json!({ "description": "subtask" });
        let raw = "agentId: abc-123\n<usage>tokens: 500</usage>";
        let mapped = map_tool("Task", &input, Some(raw)).unwrap();
        assert!(mapped.result.is_none());
    }

    #[test]
    fn grep_parameter_includes_path_and_glob() {
        let input = json!({ "pattern": "foo", "path": "/src", "glob": "*.rs" });
        let mapped = map_tool("Grep", &input, None).unwrap();
        assert_eq!(mapped.parameter, "foo in /src (*.rs)");
    }

    #[test]
    fn ask_user_question_reads_first_question() {
        let input = json!({ "questions": [{ "question": "proceed?" }, { "question": "other" }] });
        let mapped = map_tool("AskUserQuestion", &input, None).unwrap();
        assert_eq!(mapped.parameter, "proceed?");
    }
}
