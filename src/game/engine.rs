use super::{
    action::{Action, Direction},
    config::GameConfig,
    state::{GameState, Position, Snake, TerminationCause},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Information about a step
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    /// Whether the snake ate food this step
    pub ate_food: bool,
    /// Why the episode ended, if it did
    pub termination: Option<TerminationCause>,
}

/// Result of a game step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Reward for this step (for RL training)
    pub reward: f32,
    /// Whether the game has terminated
    pub terminated: bool,
    /// Additional information about the step
    pub info: StepInfo,
}

/// The game engine that handles all game logic
///
/// Randomness (food placement) comes from an explicitly seeded generator,
/// so runs with the same seed and the same action sequence are identical.
pub struct GameEngine {
    config: GameConfig,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new game engine with the given configuration and seed
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Reset the game to initial state
    ///
    /// The snake starts as a single segment at the grid center, heading
    /// right, with food placed on a random free cell.
    pub fn reset(&mut self) -> GameState {
        let center = (self.config.grid_size / 2) as i32;
        let snake = Snake::new(Position::new(center, center), Direction::Right);
        let food = self.spawn_food_avoid_snake(&snake);

        GameState::new(snake, food, self.config.grid_size)
    }

    /// Execute one step of the game
    ///
    /// The action is applied relative to the current heading, and the new
    /// heading is committed before anything else. On a fatal step the body
    /// is left where it was; only the heading and the stall counter change.
    pub fn step(&mut self, state: &mut GameState, action: Action) -> StepResult {
        if !state.is_alive {
            return StepResult {
                reward: 0.0,
                terminated: true,
                info: StepInfo {
                    ate_food: false,
                    termination: None,
                },
            };
        }

        // Commit the new heading, then look one cell ahead
        state.snake.direction = state.snake.direction.rotated(action);
        let new_head = state.snake.head().moved_in_direction(state.snake.direction);

        state.steps_since_food += 1;

        if let Some(cause) = self.check_termination(state, new_head) {
            state.is_alive = false;

            return StepResult {
                reward: self.config.death_penalty,
                terminated: true,
                info: StepInfo {
                    ate_food: false,
                    termination: Some(cause),
                },
            };
        }

        // Check if snake ate food
        let ate_food = new_head == state.food;

        // Move snake (grow if ate food)
        state.snake.move_snake(ate_food);

        let mut reward = 0.0;

        if ate_food {
            state.score += 1;
            state.food = self.spawn_food_avoid_snake(&state.snake);
            state.steps_since_food = 0;
            reward = self.config.food_reward;
        }

        StepResult {
            reward,
            terminated: false,
            info: StepInfo {
                ate_food,
                termination: None,
            },
        }
    }

    /// Check whether moving the head to `pos` ends the episode
    ///
    /// The stall check uses the pre-move snake length, so growth on the
    /// current step does not extend the budget retroactively.
    fn check_termination(&self, state: &GameState, pos: Position) -> Option<TerminationCause> {
        if !state.is_in_bounds(pos) {
            return Some(TerminationCause::Wall);
        }

        if state.snake.collides_with_body(pos) {
            return Some(TerminationCause::SelfCollision);
        }

        if state.steps_since_food > self.config.stall_limit(state.snake.len()) {
            return Some(TerminationCause::Stalled);
        }

        None
    }

    /// Spawn food at a random empty position
    ///
    /// Rejection sampling over the whole grid; assumes at least one free
    /// cell remains.
    fn spawn_food_avoid_snake(&mut self, snake: &Snake) -> Position {
        loop {
            let x = self.rng.gen_range(0..self.config.grid_size) as i32;
            let y = self.rng.gen_range(0..self.config.grid_size) as i32;
            let pos = Position::new(x, y);

            if !snake.body.contains(&pos) {
                return pos;
            }
        }
    }
}
