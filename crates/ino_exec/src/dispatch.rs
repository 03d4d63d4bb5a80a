use crate::Applets;
use crate::LaunchError;
use crate::Os;
use crate::Policy;
use crate::ProcessImage;
use crate::Route;

use tracing::debug;

use std::ffi::OsStr;
use std::ffi::OsString;
use std::path::PathBuf;

/// Path which always points at the running binary on Linux.
pub const SELF_EXE: &str = "/proc/self/exe";

/// An in-process applet ran to completion. The process is expected to
/// exit with [`Finished::code`].
#[ derive( Debug, Clone, Copy, PartialEq, Eq ) ]
#[ must_use ]
pub struct Finished( i32 );

impl Finished {
    #[ inline ]
    pub const fn code( self ) -> i32 {
        self.0
    }
}

/// Stand-in for `execvp(3)` which may run an applet instead.
#[ derive( Debug ) ]
pub struct Dispatcher<A, P = Os> {
    applets: A,
    image: P,
    policy: Policy,
    self_exe: PathBuf,
}

impl<A> Dispatcher<A, Os>
where
    A: Applets
{
    /// Dispatcher talking to the real OS.
    #[ inline ]
    pub fn new( applets: A, policy: Policy ) -> Self {
        Self::with_image( applets, Os, policy )
    }
}

impl<A, P> Dispatcher<A, P>
where
    A: Applets,
    P: ProcessImage,
{
    #[ inline ]
    pub fn with_image( applets: A, image: P, policy: Policy ) -> Self {
        Self { applets, image, policy, self_exe: SELF_EXE.into() }
    }

    /// Use another path when exec'ing ourselves.
    #[ inline ]
    #[ must_use ]
    pub fn with_self_exe( mut self, path: impl Into<PathBuf> ) -> Self {
        self.self_exe = path.into();
        self
    }

    #[ inline ]
    pub const fn policy( &self ) -> &Policy {
        &self.policy
    }

    #[ inline ]
    pub const fn image( &self ) -> &P {
        &self.image
    }

    #[ inline ]
    pub const fn applets( &self ) -> &A {
        &self.applets
    }

    /// Launch `name` with `argv`, consulting the applet table first.
    ///
    /// On success the process image is gone and this never returns,
    /// except when an applet ran in-process: then [`Finished`] carries
    /// its exit code.
    ///
    /// # Errors
    ///
    /// The program couldn't be started, see [`LaunchError`].
    #[ tracing::instrument( skip( self ) ) ]
    pub fn launch(
        &mut self,
        name: &OsStr,
        argv: &[OsString],
    ) -> Result<Finished, LaunchError> {
        match self.policy.route( &self.applets, name ) {
            Route::InProcess( handle ) => {
                debug!( ?handle, "run applet in-process" );
                let code = self.applets.run( handle, name, argv );
                return Ok( Finished( code ) )
            },
            Route::ReexecSelf => {
                debug!( self_exe = ?self.self_exe, "re-exec ourselves" );
                let err = self.image.exec( self.self_exe.as_os_str(), argv );
                debug!( ?err, "re-exec failed, try external program" );
            },
            Route::Denied => {
                debug!( "applets only, refuse external program" );
                return Err( LaunchError::Denied { name: name.to_owned() } )
            },
            Route::External => {},
        }

        let source = self.image.exec( name, argv );
        debug!( ?source, "exec failed" );
        Err( LaunchError::Exec { program: name.to_owned(), source } )
    }

    /// Replace the whole process environment with `envp`.
    ///
    /// Must not race with anything else touching the environment.
    #[ tracing::instrument( level = "debug", skip( self ) ) ]
    pub fn replace_environment( &mut self, envp: &[OsString] ) {
        self.image.replace_env( envp );
    }

    /// [`Self::launch`] with a fresh environment built from `envp`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::launch`].
    #[ inline ]
    pub fn launch_with_env(
        &mut self,
        name: &OsStr,
        argv: &[OsString],
        envp: &[OsString],
    ) -> Result<Finished, LaunchError> {
        self.replace_environment( envp );
        self.launch( name, argv )
    }

    /// Launch `argv[0]` or terminate the process trying.
    pub fn launch_or_die( &mut self, argv: &[OsString] ) -> ! {
        let name = argv.first()
            .map_or( OsStr::new( "" ), OsString::as_os_str );
        let result = self.launch( name, argv );
        finish_or_die( result, name )
    }
}

/// Exit with the applet's code, or report `err` and exit
/// with [`LaunchError::exit_code`].
pub fn finish_or_die( result: Result<Finished, LaunchError>, name: &OsStr ) -> ! {
    match result {
        Ok( finished ) => std::process::exit( finished.code() ),
        Err( err ) => {
            eprintln!( "{}", diagnostic( &whoami(), name, &err ) );
            std::process::exit( err.exit_code() )
        },
    }
}

fn diagnostic( whoami: &str, name: &OsStr, err: &LaunchError ) -> String {
    format!( "{whoami}: can't execute '{}': {err}", name.to_string_lossy() )
}

/// Basename of our own `argv[0]`.
fn whoami() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .map( std::path::Path::new )
        .and_then( std::path::Path::file_name )
        .map_or_else(
            || "exec".to_owned(),
            |it| it.to_string_lossy().into_owned()
        )
}

#[ cfg( test ) ]
#[ allow( clippy::unwrap_used ) ]
mod test {
    use super::*;
    use crate::test_double::Event;
    use crate::test_double::Recorder;
    use crate::test_double::Table;

    use assert2::check;
    use assert2::let_assert;
    use rustix::io::Errno;

    const PREFER: Policy = Policy {
        prefer_applets: true,
        force_noexec: false,
        force_applets: false,
    };

    fn argv( args: &[ &str ] ) -> Vec<OsString> {
        args.iter().map( OsString::from ).collect()
    }

    fn exec_event( program: &str, args: &[ &str ] ) -> Event {
        Event::Exec { program: program.into(), argv: argv( args ) }
    }

    #[ test ]
    fn noexec_applet_never_execs() {
        let mut dispatcher =
            Dispatcher::with_image( Table::default(), Recorder::default(), PREFER );

        let ret = dispatcher.launch( "false".as_ref(), &argv( &[ "false", "x" ] ) );

        check!( ret.unwrap().code() == 1 );
        check!( dispatcher.image().events.is_empty() );
        check!( dispatcher.applets().runs.borrow().as_slice()
            == [ ( 2, argv( &[ "false", "x" ] ) ) ] );
    }

    #[ test ]
    fn force_noexec_runs_regular_applet_in_process() {
        let policy = Policy { force_noexec: true, ..PREFER };
        let mut dispatcher =
            Dispatcher::with_image( Table::default(), Recorder::default(), policy );

        let ret = dispatcher.launch( "which".as_ref(), &argv( &[ "which" ] ) );

        check!( ret.unwrap().code() == 0 );
        check!( dispatcher.image().events.is_empty() );
    }

    #[ test ]
    fn regular_applet_reexecs_self_with_same_argv() {
        let mut dispatcher = Dispatcher::with_image(
            Table::default(),
            Recorder::failing( [ Errno::NOENT, Errno::ACCESS ] ),
            PREFER,
        ).with_self_exe( "/opt/me" );

        let ret = dispatcher.launch( "which".as_ref(), &argv( &[ "which", "ls" ] ) );

        // re-exec failed, then the external program was tried
        check!( dispatcher.image().events == [
            exec_event( "/opt/me", &[ "which", "ls" ] ),
            exec_event( "which", &[ "which", "ls" ] ),
        ] );
        let_assert!( Err( err ) = ret );
        check!( err.exit_code() == 126 );
        check!( dispatcher.applets().runs.borrow().is_empty() );
    }

    #[ test ]
    fn reexec_defaults_to_proc_self() {
        let mut dispatcher =
            Dispatcher::with_image( Table::default(), Recorder::default(), PREFER );
        let _ = dispatcher.launch( "which".as_ref(), &argv( &[ "which" ] ) );
        check!( dispatcher.image().events.first()
            == Some( &exec_event( SELF_EXE, &[ "which" ] ) ) );
    }

    #[ test ]
    fn applets_only_denies_unknown_names() {
        let policy = Policy { force_applets: true, ..PREFER };
        let mut dispatcher =
            Dispatcher::with_image( Table::default(), Recorder::default(), policy );

        let ret = dispatcher.launch( "ls".as_ref(), &argv( &[ "ls" ] ) );

        let_assert!( Err( LaunchError::Denied { name } ) = ret );
        check!( name == "ls" );
        check!( dispatcher.image().events.is_empty() );
    }

    #[ test ]
    fn external_program() {
        let mut dispatcher = Dispatcher::with_image(
            Table::default(), Recorder::failing( [ Errno::ACCESS ] ), PREFER
        );

        let ret = dispatcher.launch( "ls".as_ref(), &argv( &[ "ls", "-l" ] ) );

        check!( dispatcher.image().events == [
            exec_event( "ls", &[ "ls", "-l" ] ),
        ] );
        let_assert!( Err( err ) = ret );
        check!( !err.is_not_found() );
        check!( err.raw_os_error() == Some( Errno::ACCESS.raw_os_error() ) );
    }

    #[ test ]
    fn applets_not_consulted_by_default() {
        let mut dispatcher = Dispatcher::with_image(
            Table::default(), Recorder::default(), Policy::default()
        );

        let ret = dispatcher.launch( "true".as_ref(), &argv( &[ "true" ] ) );

        check!( dispatcher.image().events == [
            exec_event( "true", &[ "true" ] ),
        ] );
        let_assert!( Err( err ) = ret );
        check!( err.exit_code() == 127 );
        check!( dispatcher.applets().runs.borrow().is_empty() );
    }

    #[ test ]
    fn environment_replaced_before_launch() {
        let mut dispatcher = Dispatcher::with_image(
            Table::default(), Recorder::default(), Policy::default()
        );

        let envp = argv( &[ "A=1", "B=2" ] );
        let _ = dispatcher.launch_with_env(
            "env".as_ref(), &argv( &[ "env" ] ), &envp
        );

        check!( dispatcher.image().events == [
            Event::Env( envp ),
            exec_event( "env", &[ "env" ] ),
        ] );
    }

    #[ test ]
    fn environment_replaced_before_in_process_applet() {
        let mut dispatcher =
            Dispatcher::with_image( Table::default(), Recorder::default(), PREFER );

        let ret = dispatcher.launch_with_env(
            "true".as_ref(), &argv( &[ "true" ] ), &argv( &[ "A=1" ] )
        );

        check!( ret.unwrap().code() == 0 );
        check!( dispatcher.image().events == [ Event::Env( argv( &[ "A=1" ] ) ) ] );
    }

    #[ test ]
    fn diagnostic_names_program() {
        let err = LaunchError::Exec {
            program: "nope".into(),
            source: std::io::Error::from_raw_os_error( Errno::NOENT.raw_os_error() ),
        };
        let msg = diagnostic( "exequi", "nope".as_ref(), &err );
        check!( msg.starts_with( "exequi: can't execute 'nope': " ) );
        check!( msg.contains( "No such file or directory" ) );
    }
}
