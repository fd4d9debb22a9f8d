use serde::Serialize;
use xc_config::{DocumentIssue, PreflightReport};

#[derive(Debug, Clone, Serialize)]
pub struct CheckSummary {
    pub errors: usize,
    pub fatal: usize,
    pub push_blocked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub ok: bool,
    pub file: String,
    pub issues: Vec<DocumentIssue>,
    pub summary: CheckSummary,
}

impl CheckReport {
    pub fn new(file: String, report: PreflightReport) -> Self {
        let fatal = report.fatal().count();
        let summary = CheckSummary {
            errors: report.issues.len() - fatal,
            fatal,
            push_blocked: report.is_push_blocked(),
        };
        Self {
            ok: report.is_clean(),
            file,
            issues: report.issues,
            summary,
        }
    }

    /// 0 = clean, 1 = non-fatal errors, 2 = fatal (or any issue under `strict`).
    pub fn exit_code(&self, strict: bool) -> i32 {
        if self.summary.fatal > 0 || (strict && !self.ok) {
            2
        } else if self.ok {
            0
        } else {
            1
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for i in &self.issues {
            out.push_str(&format!("{} {} ({})\n", i.ptr, i.issue, i.issue.code));
        }
        if self.ok {
            out.push_str(&format!("{}: ok", self.file));
        } else {
            out.push_str(&format!(
                "{}: {} error(s), {} fatal{}",
                self.file,
                self.summary.errors,
                self.summary.fatal,
                if self.summary.push_blocked {
                    "; push blocked"
                } else {
                    ""
                }
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xc_config::{preflight, Document};

    #[test]
    fn exit_codes() -> anyhow::Result<()> {
        let clean = CheckReport::new("a".into(), PreflightReport::default());
        assert_eq!(clean.exit_code(false), 0);
        assert_eq!(clean.exit_code(true), 0);
        assert_eq!(clean.render_text(), "a: ok");

        let doc = Document::from_json(r#"{"routing": {"rules": [{}]}}"#)?;
        let errors = CheckReport::new("b".into(), preflight(&doc));
        assert_eq!(errors.exit_code(false), 1);
        assert_eq!(errors.exit_code(true), 2);

        let doc = Document::from_json(r#"{"routing": {"balancers": [{"tag": "lb"}]}}"#)?;
        let fatal = CheckReport::new("c".into(), preflight(&doc));
        assert_eq!(fatal.exit_code(false), 2);
        assert!(fatal
            .render_text()
            .contains("/routing/balancers/0 [fatal] selector"));
        assert!(fatal.render_text().ends_with("; push blocked"));
        Ok(())
    }
}
