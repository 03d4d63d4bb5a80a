mod applets;
mod cli;
mod which;

use crate::applets::Builtins;
use crate::cli::CliOpts;
use crate::cli::Command;
use crate::cli::RunOpts;

use anyhow::Context;
use anyhow::Result as AnyResult;
use ino_exec::Dispatcher;
use ino_exec::Policy;
use tap::Tap;
use tracing::debug;
use tracing::trace;

use std::ffi::OsString;

struct App;

impl App {
    #[ tracing::instrument( name = "app_run_with", skip_all ) ]
    fn run_with( cliopts: CliOpts ) -> AnyResult<i32> {
        let policy = Policy::from( cliopts.policy )
            .tap( |it| trace!( ?it ) );

        match cliopts.command {
            Command::Which( opts ) => {
                let search_path = std::env::var_os( "PATH" );
                let found = which::which(
                    &opts,
                    search_path.as_deref(),
                    &mut std::io::stdout().lock(),
                ).context( "Failed to print results" )?;
                Ok( i32::from( !found ) )
            },
            Command::Exists { name } =>
                Ok( i32::from( !ino_path::executable_exists( name ) ) ),
            Command::Run( opts ) => Self::launch( &opts, policy ),
        }
    }

    fn launch( opts: &RunOpts, policy: Policy ) -> ! {
        let mut dispatcher = Dispatcher::new( Builtins, policy );

        if !opts.touches_env() {
            dispatcher.launch_or_die( &opts.command )
        }

        let name = opts.command.first()
            .map_or_else( OsString::new, Clone::clone );
        let envp = opts.environment( std::env::vars_os() );
        debug!( ?envp, "replace environment" );

        let result = dispatcher.launch_with_env( &name, &opts.command, &envp );
        ino_exec::finish_or_die( result, &name )
    }
}

fn main() {
    ino_tracing::init_tracing_subscriber();

    let argv = std::env::args_os().collect::<Vec<_>>();

    let applet = argv.first()
        .and_then( |it| Builtins::from_argv0( it ) );
    if let Some( applet ) = applet {
        debug!( name = applet.name, "invoked as applet" );
        std::process::exit( applet.main( &argv ) )
    }

    let cliopts = {
        debug!( "Parse cliopts" );
        CliOpts::parse_from( argv ).tap( |it| trace!( ?it ) )
    };

    match App::run_with( cliopts ) {
        Ok( code ) => std::process::exit( code ),
        Err( err ) => {
            eprintln!( "{err:?}" );
            std::process::exit( 1 )
        },
    }
}
