//! Built-in policy
//!
//! Used when no config file provides a rule list. Conservative on purpose:
//! read-only tooling is approved, destructive commands are denied, anything
//! else is deferred.

use super::RuleSpec;

/// Read-only commands approved with any arguments
const READ_ONLY_COMMANDS: &[&str] = &[
    "ls", "cat", "head", "tail", "less", "wc", "grep", "rg", "fd", "tree", "file", "stat",
    "du", "df", "pwd", "echo", "printf", "which", "whoami", "id", "date", "uname", "basename",
    "dirname", "realpath", "readlink", "diff", "cmp", "sort", "uniq", "cut", "tr", "jq",
    "true", "false", "test", "[",
];

/// Destructive or privilege-changing commands, denied outright
const DESTRUCTIVE_COMMANDS: &[&str] = &[
    "shred", "mkfs", "fdisk", "parted", "wipefs", "shutdown", "reboot", "halt", "poweroff",
];

/// Prefixes stripped before matching
pub fn default_wrappers() -> Vec<RuleSpec> {
    vec![
        // FOO=bar cmd
        RuleSpec::regex("env-vars", r"^(?:[A-Za-z_][A-Za-z0-9_]*=\S*\s+)+"),
        RuleSpec::command("env", &["-i"]),
        RuleSpec::command("timeout", &["--preserve-status", "-s <arg>", "-k <arg>", "<arg>"]),
        RuleSpec::command("nice", &["-n <arg>"]),
        RuleSpec::simple("nohup", &["nohup"]),
        RuleSpec::simple("time", &["time"]),
        RuleSpec::simple("coproc", &["coproc"]),
        // .venv/bin/pytest → pytest
        RuleSpec::regex("venv", r"^(?:\S*/)?\.?venv/bin/"),
    ]
}

/// Commands always rejected, checked before any allow rule
pub fn default_deny() -> Vec<RuleSpec> {
    vec![
        RuleSpec::regex("rm-root", r"^rm\s+(?:-[a-zA-Z]+\s+)*(?:/|/\*|~|\$HOME)/?(?:\s|$)"),
        RuleSpec::regex("rm-system-dirs", r"^rm\s+(?:-[a-zA-Z]+\s+)*/(?:etc|usr|var|bin|sbin|lib|boot|opt)\b"),
        RuleSpec::regex("dd-disk-device", r"^dd\b.*\bof=/dev/(?:sd|nvme|hd|vd|xvd)[a-z]"),
        RuleSpec::regex("chmod-777-root", r"^chmod\s+(?:-R\s+)?777\s+/(?:\s|$)"),
        RuleSpec::subcommand("git", &["push"], &["-C <arg>"]),
        RuleSpec::simple("destructive", DESTRUCTIVE_COMMANDS),
        RuleSpec::simple("eval", &["eval"]),
        // `> file`, `>> file`, `2> file`, `&> file`, `>& file`; fd duplication
        // like `2>&1` and closing like `>&-` pass
        RuleSpec::regex("output-redirection", r">>?(?:\s*[^&\s]|&\s*[^0-9\s-])"),
        // Read-only tools with flags that write files or run commands, also
        // inside short flag bundles (`sort -uo`, `fd -HIx`)
        RuleSpec::regex("output-flag", r"^(?:sort|tree)\b.*\s(?:-[A-Za-z]*o|--output)"),
        RuleSpec::regex("git-output-file", r"^git\b.*\s--output(?:\s|=|$)"),
        RuleSpec::regex("exec-flag", r"^(?:fd\b.*\s(?:-[A-Za-z]*[xX]|--exec(?:-batch)?(?:\s|=|$))|rg\b.*\s--pre(?:\s|=|$))"),
        RuleSpec::regex("date-set", r"^date\b.*\s(?:-[uR]*s|--set)"),
    ]
}

/// Commands approved unattended
pub fn default_allow() -> Vec<RuleSpec> {
    vec![
        RuleSpec::simple("read-only", READ_ONLY_COMMANDS),
        RuleSpec::subcommand(
            "git",
            &[
                "status", "diff", "log", "show", "blame", "rev-parse", "ls-files", "describe",
                "shortlog",
            ],
            &["-C <arg>", "--no-pager"],
        ),
        RuleSpec::subcommand(
            "cargo",
            &[
                "build", "check", "test", "clippy", "fmt", "doc", "tree", "metadata", "bench",
            ],
            &["--offline"],
        ),
        // bare `hostname` only: with an argument it renames the host
        RuleSpec::command("hostname", &[]),
        RuleSpec::command("ps", &["aux"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;

    fn rules() -> RuleSet {
        RuleSet::compile(&default_wrappers(), &default_allow(), &default_deny()).unwrap()
    }

    #[test]
    fn test_defaults_compile() {
        let rules = rules();
        assert!(!rules.wrappers().is_empty());
        assert!(!rules.allow().is_empty());
        assert!(!rules.deny().is_empty());
    }

    #[test]
    fn test_rm_root_denied() {
        let rules = rules();
        let denied = |cmd: &str| rules.deny().iter().any(|p| p.is_match(cmd));
        assert!(denied("rm -rf /"));
        assert!(denied("rm -rf /*"));
        assert!(denied("rm -rf ~"));
        assert!(denied("rm -r -f /etc"));
        assert!(!denied("rm -rf ./node_modules"));
        assert!(!denied("rm -rf /tmp/build"));
    }

    #[test]
    fn test_output_redirection_denied() {
        let rules = rules();
        let denied = |cmd: &str| rules.deny().iter().any(|p| p.is_match(cmd));
        assert!(denied("echo evil > ~/.bashrc"));
        assert!(denied("cat a >> b"));
        assert!(denied("ls 2> errors.txt"));
        assert!(denied("echo x>file"));
        assert!(denied("echo hi >&/tmp/evil"));
        assert!(denied("echo hi >& out.log"));
        assert!(denied("ls &>> all.log"));
        assert!(!denied("ls >&2"));
        assert!(!denied("ls 1>&-"));
        assert!(!denied("cargo test 2>&1"));
        assert!(!denied("cat <<'EOF'"));
    }

    #[test]
    fn test_side_effect_flags_denied() {
        let rules = rules();
        let denied = |cmd: &str| rules.deny().iter().any(|p| p.is_match(cmd));
        assert!(denied("sort -o out.txt in.txt"));
        assert!(denied("sort --output=out.txt in.txt"));
        assert!(denied("fd -e tmp -x rm"));
        assert!(denied("fd --exec-batch rm"));
        assert!(denied("rg --pre ./decode pattern"));
        assert!(denied("rg --pre=./decode pattern"));
        assert!(denied("fd -HIx rm"));
        assert!(denied("fd -X rm"));
        assert!(denied("sort -uo out.txt in.txt"));
        assert!(denied("tree -fo out.txt"));
        assert!(denied("git diff --output=/tmp/evil"));
        assert!(denied("git -C repo log --output /tmp/evil"));
        assert!(denied("date -s 2020-01-01"));
        assert!(denied("date -us 2020-01-01"));
        assert!(denied("date --set=2020-01-01"));
        assert!(!denied("date -u +%s"));
        assert!(!denied("date -Iseconds"));
        assert!(!denied("git log --oneline"));
        assert!(!denied("sort -n numbers.txt"));
        assert!(!denied("fd -e rs"));
        assert!(!denied("fd -HI pattern"));
        assert!(!denied("tree -L 2"));
        assert!(!denied("rg --pretty foo"));
    }

    #[test]
    fn test_git_push_denied_not_allowed() {
        let rules = rules();
        assert!(rules.deny().iter().any(|p| p.is_match("git push origin main")));
        assert!(!rules.allow().iter().any(|p| p.is_match("git push origin main")));
        assert!(rules.allow().iter().any(|p| p.is_match("git -C ../repo log --oneline")));
    }

    #[test]
    fn test_command_rules_restrict_arguments() {
        let rules = rules();
        let allowed = |cmd: &str| rules.allow().iter().any(|p| p.is_match(cmd));
        assert!(allowed("hostname"));
        assert!(!allowed("hostname evil"));
        assert!(allowed("ps aux"));
        assert!(allowed("ps"));
        assert!(!allowed("ps -ef"));
    }
}
