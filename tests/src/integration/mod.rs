//! Session choreography end to end: launch, authenticate, capabilities,
//! failure recovery, teardown.

mod session_choreography;
