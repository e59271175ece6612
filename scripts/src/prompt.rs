//! Instruction template wrapped around every task description.

use crate::task::TaskRequest;

/// System-level instruction sent alongside every prompt.
pub const SYSTEM_INSTRUCTION: &str =
    "You are a Linux Kernel and Security Specialist. Output raw code optimized for Ubuntu 24.04 LTS.";

/// Wrap a task in the fixed role framing and output rules.
pub fn render_prompt(task: &TaskRequest) -> String {
    format!(
        "You are an expert Ubuntu 24.04 System Administrator and Security Engineer.\n\
         Generate a robust, executable BASH script (or Python if complex) for the following task.\n\
         Include comments explaining critical security steps.\n\
         Focus on \"Security Hardening\", \"LUKS Encryption\", \"TPM2 Tools\", and \"MySQL Hardening\".\n\
         \n\
         Task: {}\n\
         \n\
         Output ONLY the code block without markdown backticks if possible, or plain text code.\n",
        task.description().trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_task_verbatim() {
        let task = TaskRequest::new("Lock user 'guest' now").unwrap();
        let prompt = render_prompt(&task);
        assert!(prompt.contains("Task: Lock user 'guest' now\n"));
        assert!(prompt.starts_with("You are an expert Ubuntu 24.04"));
        assert!(prompt.contains("\"TPM2 Tools\""));
        assert!(prompt.contains("without markdown backticks"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let task = TaskRequest::new("x").unwrap();
        assert_eq!(render_prompt(&task), render_prompt(&task));
    }
}
