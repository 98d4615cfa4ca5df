use clap::{ArgAction, Parser};
use player_token_shared::{params::Params, signature::HashingMethod, token::TokenRequest};

pub const DEFAULT_SERVER: &str = "player.ooyala.com/sas";
pub const DEFAULT_DOMAIN: &str = "www.ooyala.com";
pub const DEFAULT_DEVICE: &str = "GENERIC";
/// Seconds a token stays valid when no expiry is given.
pub const DEFAULT_EXPIRY_WINDOW: i64 = 10 * 60;

pub const USAGE: &str = "Usage:
   player_token [-h] [-e embed_code] [-a api_key] [-s api_secret] [-m hashing_method] [-i expires] [-q account_id] [-t override_syndication_group] [-d device] [-w domain] [-f supported_formats] [-p postal_code]";

pub const HELP: &str = "   -h, --help                           Show this help.
   -e, --embed_code                     (Required) One or more embed codes for the players that will
                                        be embedded on the page, comma separated or repeated. You can
                                        use up to 50 embed codes, or the value all to create a token
                                        usable with any number of assets (e.g. with the rights locker).
   -a, --api_key                        (Required) Your provider API key. The pcode is the API key
                                        without its last 6 characters.
   -s, --api_secret                     (Required) Your 40 character secret key. Keep it private.
   -i, --expires                        (Optional) The POSIX time at which the token expires. Keep it
                                        short so the snippet cannot be replicated across domains.
                                        Defaults to the current time + 10 minutes.
   -m, --hashing_method                 (Optional) MD5 or SHA256. Defaults to SHA256.
   -q, --account_id                     (Optional) Your account or user identifier, needed for
                                        entitlements, concurrent stream limits, cross-device resume
                                        and device registration.
   -t, --override_syndication_group     (Optional) Disables all syndication controls (geo restrictions,
                                        flight times, domain controls, etc.). Only recommended for
                                        testing.
   -d, --device                         (Optional) Device class used to pick compatible stream formats.
                                        One of IPHONE, IPAD, APPLE_TV, ANDROID_SDK, ANDROID_3PLUS_SDK,
                                        ANDROID_HLS_SDK, HTML5, GENERIC_FLASH, GENERIC. Defaults to GENERIC.
   -w, --domain                         (Optional) The domain where the player is loaded.
                                        Defaults to www.ooyala.com.
   -f, --supported_formats              (Optional) Restricts the token to a set of stream formats, e.g.
                                        hds, rtmp, m3u8, mp4, akamai_hd, wv_hls, wv_mp4, wv_wvm,
                                        faxs_hls, smooth.
   -p, --postal_code                    (Optional) Postal code validated against the asset's
                                        syndication rules when postal code DMA is in use.
       --server                         (Optional) Token server host and path prefix.
                                        Defaults to player.ooyala.com/sas.
";

#[derive(Parser, Debug)]
#[command(disable_help_flag = true)]
pub struct Args {
    #[arg(short = 'h', long, action = ArgAction::SetTrue)]
    pub help: bool,
    /// Repeated values are joined with a comma, each one is kept verbatim.
    #[arg(short = 'e', long = "embed_code")]
    pub embed_codes: Vec<String>,
    #[arg(short = 'a', long = "api_key")]
    pub api_key: Option<String>,
    #[arg(short = 's', long = "api_secret")]
    pub api_secret: Option<String>,
    #[arg(short = 'm', long = "hashing_method")]
    pub hashing_method: Option<String>,
    #[arg(short = 'i', long)]
    pub expires: Option<String>,
    #[arg(short = 'q', long = "account_id")]
    pub account_id: Option<String>,
    #[arg(short = 't', long = "override_syndication_group")]
    pub override_syndication_group: Option<String>,
    #[arg(short = 'd', long)]
    pub device: Option<String>,
    #[arg(short = 'w', long)]
    pub domain: Option<String>,
    #[arg(short = 'f', long = "supported_formats")]
    pub supported_formats: Option<String>,
    #[arg(short = 'p', long = "postal_code")]
    pub postal_code: Option<String>,
    #[arg(long)]
    pub server: Option<String>,
}

/// Fully defaulted settings for one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server: String,
    pub embed_code: String,
    pub api_key: String,
    pub api_secret: String,
    pub hashing_method: HashingMethod,
    pub expires: String,
    pub account_id: String,
    pub override_syndication_group: String,
    pub device: String,
    pub domain: String,
    pub supported_formats: String,
    pub postal_code: String,
}

impl Settings {
    /// Returns `None` when help was asked for or a required value is missing
    /// or empty. `now` is the current POSIX time, used for the default expiry.
    pub fn from_args(args: Args, now: i64) -> Option<Settings> {
        let embed_code = args.embed_codes.join(",");
        let api_key = args.api_key.unwrap_or_default();
        let api_secret = args.api_secret.unwrap_or_default();

        if args.help || embed_code.is_empty() || api_key.is_empty() || api_secret.is_empty() {
            return None;
        }

        let hashing_method = args
            .hashing_method
            .as_deref()
            .map(HashingMethod::from_name)
            .unwrap_or_default();

        Some(Settings {
            server: args.server.unwrap_or_else(|| DEFAULT_SERVER.to_string()),
            embed_code,
            api_key,
            api_secret,
            hashing_method,
            expires: args
                .expires
                .unwrap_or_else(|| (now + DEFAULT_EXPIRY_WINDOW).to_string()),
            account_id: args.account_id.unwrap_or_default(),
            override_syndication_group: args.override_syndication_group.unwrap_or_default(),
            device: args.device.unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
            domain: args.domain.unwrap_or_else(|| DEFAULT_DOMAIN.to_string()),
            supported_formats: args.supported_formats.unwrap_or_default(),
            postal_code: args.postal_code.unwrap_or_default(),
        })
    }

    pub fn into_token_request(self) -> TokenRequest {
        let params = Params::from_iter([
            ("account_id", self.account_id),
            ("device", self.device),
            ("domain", self.domain),
            ("expires", self.expires),
            ("override_syndication_group", self.override_syndication_group),
            ("postal_code", self.postal_code),
            ("supported_formats", self.supported_formats),
        ]);

        TokenRequest {
            server: self.server,
            api_key: self.api_key,
            api_secret: self.api_secret,
            embed_code: self.embed_code,
            hashing_method: self.hashing_method,
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_000_000_000;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("player_token").chain(args.iter().copied()))
    }

    fn required() -> Vec<&'static str> {
        vec![
            "-e",
            "xyz789",
            "-a",
            "abc123XYZ000",
            "-s",
            "abcdef0123456789abcdef0123456789abcdef01",
        ]
    }

    #[test]
    fn test_defaults() -> Result<(), clap::Error> {
        let settings = Settings::from_args(parse(&required())?, NOW);
        let expected = Settings {
            server: DEFAULT_SERVER.to_string(),
            embed_code: "xyz789".to_string(),
            api_key: "abc123XYZ000".to_string(),
            api_secret: "abcdef0123456789abcdef0123456789abcdef01".to_string(),
            hashing_method: HashingMethod::Sha256,
            expires: "1000000600".to_string(),
            account_id: String::new(),
            override_syndication_group: String::new(),
            device: "GENERIC".to_string(),
            domain: "www.ooyala.com".to_string(),
            supported_formats: String::new(),
            postal_code: String::new(),
        };
        assert_eq!(Some(expected), settings);
        Ok(())
    }

    #[test]
    fn test_environment_is_ignored() -> Result<(), Box<dyn std::error::Error>> {
        std::env::set_var("PLAYER_TOKEN_DOMAIN", "evil.com");
        std::env::set_var("PLAYER_TOKEN_EXPIRES", "42");
        let settings = Settings::from_args(parse(&required())?, NOW).ok_or("Expected settings")?;
        assert_eq!(DEFAULT_DOMAIN, settings.domain);
        assert_eq!("1000000600", settings.expires);
        Ok(())
    }

    #[test]
    fn test_missing_required_values() -> Result<(), clap::Error> {
        assert_eq!(None, Settings::from_args(parse(&[])?, NOW));
        assert_eq!(
            None,
            Settings::from_args(parse(&["-e", "xyz", "-a", "abc123XYZ000"])?, NOW)
        );
        assert_eq!(
            None,
            Settings::from_args(parse(&["-e", "xyz", "-a", "", "-s", "secret"])?, NOW)
        );
        assert_eq!(
            None,
            Settings::from_args(parse(&["-e", "", "-a", "abc123XYZ000", "-s", "secret"])?, NOW)
        );
        Ok(())
    }

    #[test]
    fn test_help_wins() -> Result<(), clap::Error> {
        let mut args = required();
        args.push("-h");
        assert_eq!(None, Settings::from_args(parse(&args)?, NOW));
        Ok(())
    }

    #[test]
    fn test_multiple_embed_codes() -> Result<(), Box<dyn std::error::Error>> {
        let mut args = required();
        args.extend(["--embed_code", "def,ghi"]);
        let settings = Settings::from_args(parse(&args)?, NOW).ok_or("Expected settings")?;
        assert_eq!("xyz789,def,ghi", settings.embed_code);
        Ok(())
    }

    #[test]
    fn test_embed_code_is_kept_verbatim() -> Result<(), Box<dyn std::error::Error>> {
        let args = [
            "-e",
            "a, b",
            "-a",
            "abc123XYZ000",
            "-s",
            "abcdef0123456789abcdef0123456789abcdef01",
        ];
        let settings = Settings::from_args(parse(&args)?, NOW).ok_or("Expected settings")?;
        assert_eq!("a, b", settings.embed_code);
        let token = settings.into_token_request().generate()?;
        assert!(token.string_to_sign.contains("/sas/embed_token/abc123/a, b"));
        Ok(())
    }

    #[test]
    fn test_explicit_values() -> Result<(), Box<dyn std::error::Error>> {
        let mut args = required();
        args.extend([
            "-m",
            "MD5",
            "-i",
            "12345",
            "-q",
            "bob",
            "-d",
            "HTML5",
            "-w",
            "example.com",
            "--server",
            "tokens.example.com",
        ]);
        let settings = Settings::from_args(parse(&args)?, NOW).ok_or("Expected settings")?;
        assert_eq!(HashingMethod::Md5, settings.hashing_method);
        assert_eq!("12345", settings.expires);
        assert_eq!("bob", settings.account_id);
        assert_eq!("HTML5", settings.device);
        assert_eq!("example.com", settings.domain);
        assert_eq!("tokens.example.com", settings.server);
        Ok(())
    }

    #[test]
    fn test_unknown_hashing_method() -> Result<(), clap::Error> {
        let mut args = required();
        args.extend(["-m", "FOO"]);
        let settings = Settings::from_args(parse(&args)?, NOW);
        assert_eq!(
            Some(HashingMethod::Sha256),
            settings.map(|s| s.hashing_method)
        );
        Ok(())
    }

    #[test]
    fn test_into_token_request() -> Result<(), Box<dyn std::error::Error>> {
        let mut args = required();
        args.extend(["-i", "1000000000", "-d", "", "-w", ""]);
        let settings = Settings::from_args(parse(&args)?, NOW).ok_or("Expected settings")?;
        let token = settings.into_token_request().generate()?;
        assert_eq!(
            "abcdef0123456789abcdef0123456789abcdef01GET/sas/embed_token/abc123/xyz789api_key=abc123XYZ000expires=1000000000",
            token.string_to_sign
        );
        assert_eq!(
            "https://player.ooyala.com/sas/embed_token/abc123/xyz789?api_key=abc123XYZ000&expires=1000000000&signature=hJZ2liV6MGxqYn7HpF5Q35ebUuPRFQYsxnIcO8ZwBYE",
            token.url
        );
        Ok(())
    }

    #[test]
    fn test_into_token_request_signs_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let settings = Settings::from_args(parse(&required())?, NOW).ok_or("Expected settings")?;
        let token = settings.into_token_request().generate()?;
        assert!(token
            .string_to_sign
            .ends_with("device=GENERICdomain=www.ooyala.comexpires=1000000600"));
        assert!(token.url.contains("?api_key=abc123XYZ000&device=GENERIC&domain=www.ooyala.com&expires=1000000600&signature="));
        Ok(())
    }
}
