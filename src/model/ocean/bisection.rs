/*
Copyright 2023 Shelfmelt Authors

This file is part of Shelfmelt.

Shelfmelt is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

Shelfmelt is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with Shelfmelt. If not, see https://www.gnu.org/licenses/.
*/

//! Module containg methods for conducting
//! binary search (bisection) of ocean levels
//! bracketing the requested depth.
//!
//! Level bounds are strictly increasing with depth,
//! so the first index satisfying the condition is
//! also the nearest one.

use crate::{errors::SearchError, Float};

/// Core bisection function, returns the first index
/// for which `array[i] >= x` (`array[i] > x` when not inclusive),
/// or `array.len()` when there is no such index.
fn partition_point(array: &[Float], x: Float, inclusive: bool) -> usize {
    let mut lo = 0;
    let mut hi = array.len();

    while lo < hi {
        let mid = (lo + hi) / 2;

        let right_of_x = if inclusive {
            array[mid] >= x
        } else {
            array[mid] > x
        };

        if right_of_x {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }

    lo
}

fn exhausted(array: &[Float], target: Float) -> SearchError {
    SearchError::DepthBoundsExhausted {
        target,
        shallowest: array[0],
        deepest: array[array.len() - 1],
    }
}

/// Finds the shallowest level whose bound is equal
/// to or deeper than the target.
pub fn nearest_above(array: &[Float], target: Float) -> Result<usize, SearchError> {
    if array.is_empty() {
        return Err(SearchError::EmptyArray);
    }

    let index = partition_point(array, target, true);

    if index == array.len() {
        return Err(exhausted(array, target));
    }

    Ok(index)
}

/// Finds the deepest level whose bound is equal
/// to or shallower than the target.
pub fn nearest_below(array: &[Float], target: Float) -> Result<usize, SearchError> {
    if array.is_empty() {
        return Err(SearchError::EmptyArray);
    }

    let index = partition_point(array, target, false);

    if index == 0 {
        return Err(exhausted(array, target));
    }

    Ok(index - 1)
}
