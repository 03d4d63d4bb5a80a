//! A drop-in for `execvp(3)` which knows about applets.
//!
//! Multi-call binaries implement some programs themselves. Before
//! asking the OS to run a program, [`Dispatcher`] checks whether an
//! applet by that name exists and, depending on [`Policy`], runs it
//! in-process, re-execs the binary itself, or refuses to go further.
//!
//! Everything touching global process state goes through
//! [`ProcessImage`], [`Os`] being the real implementation.

mod applet;
mod dispatch;
mod error;
mod image;
mod policy;

#[ cfg( test ) ]
mod test_double;

pub use applet::Applets;
pub use applet::NoApplets;
pub use dispatch::finish_or_die;
pub use dispatch::Dispatcher;
pub use dispatch::Finished;
pub use dispatch::SELF_EXE;
pub use error::LaunchError;
pub use error::EXIT_CANNOT_EXECUTE;
pub use error::EXIT_NOT_FOUND;
pub use image::Os;
pub use image::ProcessImage;
pub use policy::Policy;
pub use policy::Route;
