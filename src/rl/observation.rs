use burn::tensor::{Tensor, TensorData, backend::Backend};

use crate::game::{Action, Direction, GameState};

/// Number of features in an observation
pub const OBSERVATION_SIZE: usize = 11;

/// Build the compact 11-feature observation for a game state
///
/// Features, in order:
/// - 0: danger one cell ahead
/// - 1: danger one cell to the right of the heading
/// - 2: danger one cell to the left of the heading
/// - 3-6: heading one-hot (left, right, up, down)
/// - 7-10: food direction relative to the head (left, right, up, down)
///
/// Every component is 0.0 or 1.0. The danger and food features are relative
/// to whatever heading the state currently carries, including the heading
/// committed on a fatal step.
pub fn observe(state: &GameState) -> [f32; OBSERVATION_SIZE] {
    let [danger_straight, danger_right, danger_left] = danger_features(state);
    let [dir_left, dir_right, dir_up, dir_down] = heading_features(state);
    let [food_left, food_right, food_up, food_down] = food_features(state);

    [
        danger_straight,
        danger_right,
        danger_left,
        dir_left,
        dir_right,
        dir_up,
        dir_down,
        food_left,
        food_right,
        food_up,
        food_down,
    ]
}

/// Build a `[batch, OBSERVATION_SIZE]` tensor from a batch of observations
pub fn batch_to_tensor<B: Backend>(
    observations: &[[f32; OBSERVATION_SIZE]],
    device: &B::Device,
) -> Tensor<B, 2> {
    let mut data = Vec::with_capacity(observations.len() * OBSERVATION_SIZE);
    for obs in observations {
        data.extend_from_slice(obs);
    }

    let tensor_data = TensorData::new(data, [observations.len(), OBSERVATION_SIZE]);

    Tensor::<B, 2>::from_data(tensor_data, device)
}

/// Danger flags for the three cells the snake could move into next
fn danger_features(state: &GameState) -> [f32; 3] {
    let head = state.snake.head();
    let heading = state.snake.direction;

    let danger = |direction: Direction| bit(state.is_collision(head.moved_in_direction(direction)));

    [
        danger(heading),
        danger(heading.rotated(Action::TurnRight)),
        danger(heading.rotated(Action::TurnLeft)),
    ]
}

/// One-hot encoding of the current heading
fn heading_features(state: &GameState) -> [f32; 4] {
    let heading = state.snake.direction;

    [
        bit(heading == Direction::Left),
        bit(heading == Direction::Right),
        bit(heading == Direction::Up),
        bit(heading == Direction::Down),
    ]
}

/// Food location flags relative to the head, one per axis direction
///
/// Diagonal food sets two flags; food aligned with the head on an axis
/// sets neither flag for that axis.
fn food_features(state: &GameState) -> [f32; 4] {
    let head = state.snake.head();
    let food = state.food;

    [
        bit(food.x < head.x),
        bit(food.x > head.x),
        bit(food.y < head.y),
        bit(food.y > head.y),
    ]
}

fn bit(flag: bool) -> f32 {
    if flag { 1.0 } else { 0.0 }
}
