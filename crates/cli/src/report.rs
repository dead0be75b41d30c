use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub preference_key: String,
    pub blacklist: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ScanOutput {
    pub loaded: Vec<String>,
    /// Seen during the scan but skipped because they are blacklisted
    pub suppressed: Vec<String>,
    /// Files not loaded: suppressed ones and non-container files
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct ActionOutput {
    pub action: String,
    pub added: usize,
    pub removed: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Output {
    Status(StatusOutput),
    Scan(ScanOutput),
    Action(ActionOutput),
}

impl Output {
    pub fn print(&self, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
        } else {
            print!("{}", self.render_text());
        }
        Ok(())
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        match self {
            Output::Status(status) => {
                out.push_str(&format!(
                    "{} blacklisted containers ({})\n",
                    status.blacklist.len(),
                    status.preference_key
                ));
                for id in &status.blacklist {
                    out.push_str(&format!("  {id}\n"));
                }
            }
            Output::Scan(scan) => {
                out.push_str(&format!(
                    "Loaded {} containers, suppressed {}, {} files skipped\n",
                    scan.loaded.len(),
                    scan.suppressed.len(),
                    scan.skipped
                ));
                for id in &scan.suppressed {
                    out.push_str(&format!("  - {id}\n"));
                }
            }
            Output::Action(action) => {
                out.push_str(&format!("{}\n", action.action));
                out.push_str(&format!(
                    "  added: {}  removed: {}  blacklisted: {}\n",
                    action.added, action.removed, action.total
                ));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lists_every_id() {
        let output = Output::Status(StatusOutput {
            preference_key: "start_optimiser/id_blacklist".to_string(),
            blacklist: vec!["a".to_string(), "b".to_string()],
        });
        let text = output.render_text();
        assert!(text.starts_with("2 blacklisted containers"));
        assert!(text.contains("  a\n"));
        assert!(text.contains("  b\n"));
    }

    #[test]
    fn json_carries_kind_tag() {
        let output = Output::Action(ActionOutput {
            action: "allow".to_string(),
            added: 0,
            removed: 1,
            total: 3,
        });
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["kind"], "action");
        assert_eq!(value["removed"], 1);
    }
}
