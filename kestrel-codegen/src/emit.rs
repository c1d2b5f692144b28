//! Assembly text emission

use crate::asm::AsmInst;

/// Render each instruction as one line of assembly
pub fn emit_instructions(instructions: &[AsmInst]) -> Vec<String> {
    instructions.iter().map(|inst| inst.to_string()).collect()
}

/// Join lines into a newline-terminated text
pub fn join_lines(lines: &[String]) -> String {
    let mut text = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        text.push_str(line);
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::Reg;

    #[test]
    fn test_emit_lines() {
        let lines = emit_instructions(&[
            AsmInst::Directive(".text".to_string()),
            AsmInst::Bl("malloc".to_string()),
        ]);
        assert_eq!(lines, vec!["\t.text".to_string(), "\tbl malloc".to_string()]);
        assert_eq!(join_lines(&lines), "\t.text\n\tbl malloc\n");
    }

    #[test]
    fn test_join_empty() {
        assert_eq!(join_lines(&[]), "");
        assert_eq!(emit_instructions(&[AsmInst::Mov(Reg::X(0), Reg::X(1))]), vec!["\tmov x0, x1"]);
    }
}
