//! Attack simulations against the host/guest trust boundary.

mod channel_attacks;
