use crate::game::question::Difficulty;

pub const WIN_TARGET: u32 = 10;
pub const MAX_HEARTS: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stage {
    pub difficulty: Difficulty,
    pub needed_correct: u32,
}

pub const STAGES: [Stage; 3] = [
    Stage {
        difficulty: Difficulty::Easy,
        needed_correct: 3,
    },
    Stage {
        difficulty: Difficulty::Medium,
        needed_correct: 3,
    },
    Stage {
        difficulty: Difficulty::Hard,
        needed_correct: 4,
    },
];

pub fn points_for_difficulty(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Easy => 10,
        Difficulty::Medium => 20,
        Difficulty::Hard => 30,
    }
}

pub fn stage(index: usize) -> Option<&'static Stage> {
    STAGES.get(index)
}

pub fn has_next_stage(index: usize) -> bool {
    index + 1 < STAGES.len()
}
