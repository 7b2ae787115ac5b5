//! Instruction set, source filtering and loop matching.

use std::fmt;

use crate::machine::MachineError;

/// One of the eight recognized instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Right,
    Left,
    Inc,
    Dec,
    Output,
    Input,
    LoopOpen,
    LoopClose,
}

impl Op {
    pub fn from_char(c: char) -> Option<Op> {
        Some(match c {
            '>' => Op::Right,
            '<' => Op::Left,
            '+' => Op::Inc,
            '-' => Op::Dec,
            '.' => Op::Output,
            ',' => Op::Input,
            '[' => Op::LoopOpen,
            ']' => Op::LoopClose,
            _ => return None,
        })
    }

    pub fn symbol(self) -> char {
        match self {
            Op::Right => '>',
            Op::Left => '<',
            Op::Inc => '+',
            Op::Dec => '-',
            Op::Output => '.',
            Op::Input => ',',
            Op::LoopOpen => '[',
            Op::LoopClose => ']',
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketKind {
    Open,
    Close,
}

impl fmt::Display for BracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketKind::Open => write!(f, "'['"),
            BracketKind::Close => write!(f, "']'"),
        }
    }
}

/// Keep only instruction characters; everything else is a comment.
pub fn filter_source(source: &str) -> String {
    source.chars().filter(|&c| Op::from_char(c).is_some()).collect()
}

/// A filtered program together with its precomputed jump table.
#[derive(Debug, Clone)]
pub struct Program {
    ops: Vec<Op>,
    // jumps[i] holds the matching index for '[' or ']' at index i.
    jumps: Vec<Option<usize>>,
}

impl Program {
    /// Filter `source` and match its brackets.
    ///
    /// Fails on the first unmatched `]`, or on the bottommost unmatched `[`
    /// once the whole program has been scanned.
    pub fn parse(source: &str) -> Result<Program, MachineError> {
        let ops: Vec<Op> = source.chars().filter_map(Op::from_char).collect();
        let jumps = build_jump_table(&ops)?;
        Ok(Program { ops, jumps })
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The instruction at `ip`, or `None` past the end of the program.
    pub fn op(&self, ip: usize) -> Option<Op> {
        self.ops.get(ip).copied()
    }

    /// Matching bracket position for the bracket at `ip`, if any.
    pub fn jump(&self, ip: usize) -> Option<usize> {
        self.jumps.get(ip).copied().flatten()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            write!(f, "{op}")?;
        }
        Ok(())
    }
}

fn build_jump_table(ops: &[Op]) -> Result<Vec<Option<usize>>, MachineError> {
    let mut jumps: Vec<Option<usize>> = vec![None; ops.len()];
    let mut stack: Vec<usize> = Vec::new();

    for (i, op) in ops.iter().enumerate() {
        match op {
            Op::LoopOpen => stack.push(i),
            Op::LoopClose => {
                let Some(open_index) = stack.pop() else {
                    return Err(MachineError::UnmatchedBracket {
                        ip: i,
                        kind: BracketKind::Close,
                    });
                };
                jumps[open_index] = Some(i);
                jumps[i] = Some(open_index);
            }
            _ => {}
        }
    }

    if let Some(&unmatched_open) = stack.first() {
        return Err(MachineError::UnmatchedBracket {
            ip: unmatched_open,
            kind: BracketKind::Open,
        });
    }

    Ok(jumps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_are_dropped() {
        assert_eq!(filter_source("a+b-c[ x ]\n.,<>"), "+-[].,<>");
        assert_eq!(filter_source("hello world"), "");
    }

    #[test]
    fn nested_loops_are_paired() {
        let program = Program::parse("[[]+[]]").unwrap();
        assert_eq!(program.jump(0), Some(6));
        assert_eq!(program.jump(6), Some(0));
        assert_eq!(program.jump(1), Some(2));
        assert_eq!(program.jump(2), Some(1));
        assert_eq!(program.jump(4), Some(5));
        assert_eq!(program.jump(3), None);
    }

    #[test]
    fn positions_refer_to_the_filtered_program() {
        let program = Program::parse("x [ y ] z").unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program.jump(0), Some(1));
        assert_eq!(program.to_string(), "[]");
    }

    #[test]
    fn unmatched_open_reports_outermost() {
        let err = Program::parse("[[").unwrap_err();
        assert!(matches!(err, MachineError::UnmatchedBracket { ip: 0, kind: BracketKind::Open }));

        let err = Program::parse("+[[]").unwrap_err();
        assert!(matches!(err, MachineError::UnmatchedBracket { ip: 1, kind: BracketKind::Open }));
    }

    #[test]
    fn unmatched_close_reports_first_stray() {
        let err = Program::parse("]").unwrap_err();
        assert!(matches!(err, MachineError::UnmatchedBracket { ip: 0, kind: BracketKind::Close }));

        let err = Program::parse("[]+]]").unwrap_err();
        assert!(matches!(err, MachineError::UnmatchedBracket { ip: 3, kind: BracketKind::Close }));
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let depth = 100_000;
        let source = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
        let program = Program::parse(&source).unwrap();
        assert_eq!(program.jump(0), Some(2 * depth - 1));
        assert_eq!(program.jump(depth - 1), Some(depth));
    }

    #[test]
    fn op_past_the_end_is_none() {
        let program = Program::parse("+-").unwrap();
        assert_eq!(program.op(0), Some(Op::Inc));
        assert_eq!(program.op(1), Some(Op::Dec));
        assert_eq!(program.op(2), None);
        assert_eq!(program.op(usize::MAX), None);
    }

    #[test]
    fn every_bracket_has_a_partner() {
        let program = Program::parse("+[>[-]<[->+<]]>[.[-]]").unwrap();
        for ip in 0..program.len() {
            let op = program.op(ip).unwrap();
            if matches!(op, Op::LoopOpen | Op::LoopClose) {
                let partner = program.jump(ip).unwrap();
                assert_eq!(program.jump(partner), Some(ip));
            } else {
                assert_eq!(program.jump(ip), None);
            }
        }
    }
}
