// THEORY:
// The shape filter keeps only the part of the current color map that the
// previous frame agrees with. A coordinate survives when it scored in both
// frames; everything else is zeroed. What is left is the stable "body" of the
// object, which moves slowly between frames, as opposed to noise that flickers.
//
// The output has exactly the keys of the current map. Keys that only exist in
// the previous map are dropped: the window may have moved since then.

use crate::core_modules::score_map::ScoreMap;

pub fn apply(curr: &ScoreMap, prev: &ScoreMap) -> ScoreMap {
    curr.map_scores(|coordinate, score| match prev.get(&coordinate) {
        Some(previous) if previous > 0.0 => score,
        _ => 0.0,
    })
}
