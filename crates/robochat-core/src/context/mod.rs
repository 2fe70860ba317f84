//! Context window management: which history fits under the model's token
//! limit, and how the surviving dialogue is rendered into a prompt.

pub mod window;
