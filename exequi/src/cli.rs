use crate::which::WhichOpts;

use ino_exec::Policy;

use std::ffi::OsString;

/// Find and launch programs, some of which are built in.
///
/// Symlink exequi as one of its applets (`true`, `false`, `which`)
/// to run that applet directly.
#[ derive( clap::Parser, Debug ) ]
#[ command( version ) ]
pub struct CliOpts {
    #[ command( flatten ) ]
    pub policy: PolicyOpts,

    #[ command( subcommand ) ]
    pub command: Command,
}

impl CliOpts {
    #[ inline ]
    pub fn parse_from( argv: Vec<OsString> ) -> Self {
        <Self as clap::Parser>::parse_from( argv )
    }
}

/// How applets take part in `run`.
#[ derive( clap::Args, Debug, Clone, Copy ) ]
pub struct PolicyOpts {
    /// Use a built-in applet instead of an external program
    /// of the same name.
    #[ arg( long, env = "EXEQUI_PREFER_APPLETS" ) ]
    pub prefer_applets: bool,

    /// Run every applet in-process, never exec.
    #[ arg( long, env = "EXEQUI_FORCE_NOEXEC" ) ]
    pub force_noexec: bool,

    /// Only applets may be run, external programs fail as missing.
    #[ arg( long, env = "EXEQUI_FORCE_APPLETS" ) ]
    pub force_applets: bool,
}

impl From<PolicyOpts> for Policy {
    #[ inline ]
    fn from( opts: PolicyOpts ) -> Self {
        let PolicyOpts { prefer_applets, force_noexec, force_applets } = opts;
        Self { prefer_applets, force_noexec, force_applets }
    }
}

#[ derive( clap::Subcommand, Debug ) ]
pub enum Command {
    Which( WhichOpts ),

    /// Exit successfully if NAME is an executable in $PATH.
    Exists {
        name: OsString,
    },

    Run( RunOpts ),
}

/// Replace exequi with PROGRAM.
///
/// Exits 127 if PROGRAM can't be found and 126 if it can't be run.
#[ derive( clap::Args, Debug ) ]
pub struct RunOpts {
    /// Start from an empty environment.
    #[ arg( short, long ) ]
    pub ignore_environment: bool,

    /// Set an environment variable, may be repeated.
    #[ arg( short, long = "env", value_name = "KEY=VALUE" ) ]
    pub envs: Vec<OsString>,

    /// The program followed by its arguments.
    #[ arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "PROGRAM",
    ) ]
    pub command: Vec<OsString>,
}

impl RunOpts {
    /// Whether the environment needs to be rebuilt before launching.
    #[ inline ]
    pub fn touches_env( &self ) -> bool {
        self.ignore_environment || !self.envs.is_empty()
    }

    /// The complete environment for the program, later entries
    /// override earlier ones.
    pub fn environment(
        &self,
        inherited: impl IntoIterator<Item = ( OsString, OsString )>,
    ) -> Vec<OsString> {
        let mut envp = vec![];
        if !self.ignore_environment {
            for ( key, val ) in inherited {
                let mut entry = key;
                entry.push( "=" );
                entry.push( val );
                envp.push( entry );
            }
        }
        envp.extend( self.envs.iter().cloned() );
        envp
    }
}

#[ cfg( test ) ]
#[ allow( clippy::unwrap_used ) ]
mod test {
    use super::*;
    use assert2::check;
    use assert2::let_assert;

    fn parse( args: &[ &str ] ) -> CliOpts {
        <CliOpts as clap::Parser>::try_parse_from(
            std::iter::once( "exequi" ).chain( args.iter().copied() )
        ).unwrap()
    }

    #[ test ]
    fn run_keeps_program_flags() {
        let opts = parse( &[ "run", "-e", "A=1", "ls", "-l", "--all" ] );
        let_assert!( Command::Run( run ) = opts.command );
        check!( run.envs == [ "A=1" ] );
        check!( run.command == [ "ls", "-l", "--all" ] );
        check!( run.touches_env() );
    }

    #[ test ]
    fn policy_flags() {
        let opts =
            parse( &[ "--prefer-applets", "--force-noexec", "exists", "x" ] );
        let policy = Policy::from( opts.policy );
        check!( policy.prefer_applets );
        check!( policy.force_noexec );
        check!( !policy.force_applets );
    }

    #[ test ]
    fn environment_building() {
        let inherited =
            || vec![ ( OsString::from( "HOME" ), OsString::from( "/root" ) ) ];

        let run = RunOpts {
            ignore_environment: false,
            envs: vec![ "A=1".into() ],
            command: vec![ "env".into() ],
        };
        check!( run.environment( inherited() ) == [ "HOME=/root", "A=1" ] );

        let run = RunOpts { ignore_environment: true, ..run };
        check!( run.environment( inherited() ) == [ "A=1" ] );
    }
}
