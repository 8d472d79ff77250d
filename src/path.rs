//! Path-code compiler.
//!
//! A path code is a compact movement script such as `"R3 P2 FU D"`:
//!
//! | token        | effect                                                        |
//! |--------------|---------------------------------------------------------------|
//! | `U D L R` n  | move n cells (default 1), one step per cell, `dir` = letter   |
//! | `P` n        | stay put for n steps, `dir` = current facing                  |
//! | `F` x n      | stay put for n steps facing x, and make x the current facing  |
//!
//! Letters are case-insensitive and whitespace is ignored. Movement letters
//! do not change the current facing; only `F` does.

use serde::{Deserialize, Serialize};

use crate::components::Facing;
use crate::error::PathError;

/// A single point on a compiled path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub x: i32,
    pub y: i32,
    pub dir: Option<Facing>,
}

impl PathStep {
    pub fn new(x: i32, y: i32, dir: Option<Facing>) -> Self {
        Self { x, y, dir }
    }
}

const COMMANDS: &[char] = &['U', 'D', 'L', 'R', 'P', 'F'];

/// Cheap syntactic pre-check for authoring tools.
///
/// Accepts a non-empty code made only of command letters, digits and
/// whitespace that starts with a command letter. Passing this check does not
/// guarantee `parse_code` succeeds (`"F2"` passes here and fails there).
pub fn valid_path_syntax(code: &str) -> bool {
    let mut chars = code.chars().filter(|c| !c.is_whitespace()).peekable();
    match chars.peek() {
        Some(first) if COMMANDS.contains(&first.to_ascii_uppercase()) => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_digit() || COMMANDS.contains(&c.to_ascii_uppercase()))
}

/// Compile a path code into concrete steps starting at `(start_col, start_row)`.
///
/// Stops at the first malformed token; nothing is silently skipped.
pub fn parse_code(
    code: &str,
    start_col: i32,
    start_row: i32,
    initial_dir: Facing,
) -> Result<Vec<PathStep>, PathError> {
    // Positions in errors refer to the whitespace-free, upper-cased code.
    let chars: Vec<char> = code
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let mut steps = Vec::new();
    let (mut x, mut y) = (start_col, start_row);
    let mut facing = initial_dir;
    let mut i = 0;

    while i < chars.len() {
        let cmd = chars[i];
        let pos = i;
        i += 1;
        match cmd {
            'U' | 'D' | 'L' | 'R' => {
                let count = read_count(&chars, &mut i)?;
                let dir = Facing::from_char(cmd).ok_or(PathError::UnknownCommand { ch: cmd, pos })?;
                let (dx, dy) = dir.delta();
                for _ in 0..count {
                    x += dx;
                    y += dy;
                    steps.push(PathStep::new(x, y, Some(dir)));
                }
            }
            'P' => {
                let count = read_count(&chars, &mut i)?;
                for _ in 0..count {
                    steps.push(PathStep::new(x, y, Some(facing)));
                }
            }
            'F' => {
                let arg = *chars.get(i).ok_or(PathError::MissingFaceDirection { pos })?;
                facing = Facing::from_char(arg).ok_or(PathError::InvalidFaceDirection { ch: arg, pos: i })?;
                i += 1;
                let count = read_count(&chars, &mut i)?;
                for _ in 0..count {
                    steps.push(PathStep::new(x, y, Some(facing)));
                }
            }
            other => return Err(PathError::UnknownCommand { ch: other, pos }),
        }
    }

    Ok(steps)
}

/// Greedily read the digits at `chars[*i..]`; no digits means 1.
fn read_count(chars: &[char], i: &mut usize) -> Result<u32, PathError> {
    let start = *i;
    let mut count: u32 = 0;
    while let Some(digit) = chars.get(*i).and_then(|c| c.to_digit(10)) {
        count = count
            .checked_mul(10)
            .and_then(|c| c.checked_add(digit))
            .ok_or(PathError::CountOverflow { pos: start })?;
        *i += 1;
    }
    Ok(if *i == start { 1 } else { count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_movement() {
        let steps = parse_code("R3", 0, 0, Facing::D).unwrap();
        assert_eq!(
            steps,
            vec![
                PathStep::new(1, 0, Some(Facing::R)),
                PathStep::new(2, 0, Some(Facing::R)),
                PathStep::new(3, 0, Some(Facing::R)),
            ]
        );
    }

    #[test]
    fn test_pause_keeps_position_and_initial_facing() {
        let steps = parse_code("U2P2", 5, 5, Facing::D).unwrap();
        assert_eq!(
            steps,
            vec![
                PathStep::new(5, 4, Some(Facing::U)),
                PathStep::new(5, 3, Some(Facing::U)),
                // Movement letters do not update the facing used by P.
                PathStep::new(5, 3, Some(Facing::D)),
                PathStep::new(5, 3, Some(Facing::D)),
            ]
        );
    }

    #[test]
    fn test_face_updates_facing_for_later_pauses() {
        let steps = parse_code("fl2 p", 1, 1, Facing::D).unwrap();
        assert_eq!(steps.len(), 3);
        assert!(steps.iter().all(|s| s.x == 1 && s.y == 1 && s.dir == Some(Facing::L)));
    }

    #[test]
    fn test_default_count_and_whitespace() {
        let steps = parse_code(" d  l ", 0, 0, Facing::U).unwrap();
        assert_eq!(steps, vec![PathStep::new(0, 1, Some(Facing::D)), PathStep::new(-1, 1, Some(Facing::L))]);
    }

    #[test]
    fn test_multi_digit_counts_are_greedy() {
        let steps = parse_code("R12", 0, 0, Facing::U).unwrap();
        assert_eq!(steps.len(), 12);
        assert_eq!(steps.last().unwrap().x, 12);
    }

    #[test]
    fn test_zero_count_emits_nothing() {
        assert!(parse_code("U0", 0, 0, Facing::U).unwrap().is_empty());
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_code("R2X", 0, 0, Facing::U),
            Err(PathError::UnknownCommand { ch: 'X', pos: 2 })
        );
        assert_eq!(parse_code("F", 0, 0, Facing::U), Err(PathError::MissingFaceDirection { pos: 0 }));
        assert_eq!(
            parse_code("FP", 0, 0, Facing::U),
            Err(PathError::InvalidFaceDirection { ch: 'P', pos: 1 })
        );
        assert_eq!(parse_code("3R", 0, 0, Facing::U), Err(PathError::UnknownCommand { ch: '3', pos: 0 }));
        assert_eq!(
            parse_code("U99999999999", 0, 0, Facing::U),
            Err(PathError::CountOverflow { pos: 1 })
        );
    }

    #[test]
    fn test_valid_path_syntax() {
        assert!(valid_path_syntax("U3 D1 P2"));
        assert!(valid_path_syntax("flp"));
        assert!(!valid_path_syntax(""));
        assert!(!valid_path_syntax("   "));
        assert!(!valid_path_syntax("3U"));
        assert!(!valid_path_syntax("U3X"));
        assert!(!valid_path_syntax("U-1"));
    }
}
