use crate::art::ArtImage;

/// Which way the track change is going, relative to the play queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    SlideInLeft,
    SlideInRight,
    SlideOutLeft,
    SlideOutRight,
}

/// Enter and exit effects applied to the incoming and outgoing buffers of a
/// track change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPair {
    pub incoming: Transition,
    pub outgoing: Transition,
}

impl TransitionPair {
    /// Forward changes slide in from the right, backward changes from the
    /// left. Purely cosmetic, but kept consistent so repeated skips read as
    /// movement through the queue.
    pub fn for_direction(direction: Direction) -> Self {
        match direction {
            Direction::Forward => Self {
                incoming: Transition::SlideInRight,
                outgoing: Transition::SlideOutLeft,
            },
            Direction::Backward => Self {
                incoming: Transition::SlideInLeft,
                outgoing: Transition::SlideOutRight,
            },
        }
    }
}

/// Double-buffered display surface.
///
/// `show_incoming` hands over a new image together with its transition pair;
/// afterwards that image is the current buffer and the previous one animates
/// out. Each buffer carries its own rotation angle in degrees: the incoming
/// angle is staged with `set_incoming_angle` before the handover, the
/// current angle follows the running spin.
pub trait RenderTarget {
    fn show_incoming(&mut self, image: ArtImage, transitions: TransitionPair);

    fn current_angle(&self) -> f32;

    fn set_current_angle(&mut self, degrees: f32);

    fn set_incoming_angle(&mut self, degrees: f32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_and_backward_use_opposite_slides() {
        let forward = TransitionPair::for_direction(Direction::Forward);
        assert_eq!(forward.incoming, Transition::SlideInRight);
        assert_eq!(forward.outgoing, Transition::SlideOutLeft);

        let backward = TransitionPair::for_direction(Direction::Backward);
        assert_eq!(backward.incoming, Transition::SlideInLeft);
        assert_eq!(backward.outgoing, Transition::SlideOutRight);
    }
}
