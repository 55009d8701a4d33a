// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod forms;
pub mod menu;
pub mod modal;
pub mod state;
pub mod toast;

pub use forms::*;
pub use menu::*;
pub use modal::*;
pub use state::*;
pub use toast::*;
