// ABOUTME: Integration tests for validated identifiers, ports, and repository references.
// ABOUTME: Includes property tests for deterministic naming and port derivation.

use dockyard::types::*;
use proptest::prelude::*;

mod repo_ref_tests {
    use super::*;

    #[test]
    fn parse_plain_url() {
        let repo = RepoRef::parse("https://github.com/ownerB/repoB").unwrap();
        assert_eq!(repo.owner(), "ownerB");
        assert_eq!(repo.repo(), "repoB");
        assert_eq!(repo.to_string(), "ownerB/repoB");
        assert_eq!(repo.clone_url(), "https://github.com/ownerB/repoB.git");
    }

    #[test]
    fn parse_accepts_git_suffix_and_trailing_slash() {
        let a = RepoRef::parse("https://github.com/o/r.git").unwrap();
        let b = RepoRef::parse("https://github.com/o/r/").unwrap();
        let c = RepoRef::parse("  https://github.com/o/r  ").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn parse_allows_dots_dashes_underscores() {
        let repo = RepoRef::parse("https://github.com/my-org/my_app.v2").unwrap();
        assert_eq!(repo.repo(), "my_app.v2");
    }

    #[test]
    fn reject_empty() {
        assert_eq!(RepoRef::parse("   "), Err(RepoRefError::Empty));
    }

    #[test]
    fn reject_other_hosts_and_schemes() {
        for url in [
            "https://gitlab.com/o/r",
            "http://github.com/o/r",
            "git@github.com:o/r.git",
            "github.com/o/r",
        ] {
            assert!(
                matches!(RepoRef::parse(url), Err(RepoRefError::UnsupportedHost(_))),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn reject_wrong_path_shape() {
        for url in [
            "https://github.com/owner",
            "https://github.com/owner/",
            "https://github.com//repo",
            "https://github.com/o/r/tree/main",
        ] {
            assert!(
                matches!(RepoRef::parse(url), Err(RepoRefError::InvalidPath(_))),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn reject_shell_metacharacters() {
        assert_eq!(
            RepoRef::parse("https://github.com/o/r;rm"),
            Err(RepoRefError::InvalidChar(';'))
        );
        assert_eq!(
            RepoRef::parse("https://github.com/o w/r"),
            Err(RepoRefError::InvalidChar(' '))
        );
    }
}

mod application_id_tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert_eq!(ApplicationId::new(0), Err(ApplicationIdError::Zero));
        assert!("0".parse::<ApplicationId>().is_err());
    }

    #[test]
    fn parse_from_cli_argument() {
        let id: ApplicationId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.slug(), "app-42");
        assert!(matches!(
            "forty-two".parse::<ApplicationId>(),
            Err(ApplicationIdError::NotANumber(_))
        ));
    }

    #[test]
    fn serde_rejects_zero() {
        assert!(serde_json::from_str::<ApplicationId>("0").is_err());
        assert_eq!(
            serde_json::from_str::<ApplicationId>("5").unwrap().get(),
            5
        );
    }
}

mod port_tests {
    use super::*;

    #[test]
    fn container_port_bounds() {
        assert!(ContainerPort::new(1023).is_err());
        assert_eq!(ContainerPort::new(1024).unwrap().get(), 1024);
        assert_eq!(ContainerPort::new(65535).unwrap().get(), 65535);
        assert_eq!(ContainerPort::new(65536), Err(PortError::OutOfRange(65536)));
    }

    #[test]
    fn internal_port_is_base_plus_id() {
        let id = ApplicationId::new(42).unwrap();
        assert_eq!(InternalPort::derive(10000, id).unwrap().get(), 10042);
    }

    #[test]
    fn internal_port_overflow_is_exhaustion() {
        let id = ApplicationId::new(2).unwrap();
        assert_eq!(
            InternalPort::derive(65534, id),
            Err(PortError::RangeExhausted { id, base: 65534 })
        );
    }

    #[test]
    fn container_port_serde_validates() {
        assert!(serde_json::from_str::<ContainerPort>("80").is_err());
        assert_eq!(
            serde_json::to_string(&ContainerPort::new(8000).unwrap()).unwrap(),
            "8000"
        );
    }
}

mod identity_tests {
    use super::*;

    #[test]
    fn names_derive_from_id() {
        let id = ApplicationId::new(7).unwrap();
        let identity = ApplicationIdentity {
            id,
            repo_url: "https://github.com/o/r".to_string(),
            internal_port: InternalPort::derive(10000, id).unwrap(),
            container_port: ContainerPort::new(3000).unwrap(),
        };
        assert_eq!(identity.image_name().as_str(), "app-7-image");
        assert_eq!(identity.container_name().as_str(), "app-7-container");
    }
}

proptest! {
    #[test]
    fn distinct_ids_get_distinct_ports(a in 1u32..=55535, b in 1u32..=55535) {
        prop_assume!(a != b);
        let pa = InternalPort::derive(10000, ApplicationId::new(a).unwrap()).unwrap();
        let pb = InternalPort::derive(10000, ApplicationId::new(b).unwrap()).unwrap();
        prop_assert_ne!(pa, pb);
    }

    #[test]
    fn names_are_stable_and_distinct(a in 1u32..1_000_000, b in 1u32..1_000_000) {
        let ia = ApplicationId::new(a).unwrap();
        let ib = ApplicationId::new(b).unwrap();
        prop_assert_eq!(ImageName::for_application(ia), ImageName::for_application(ia));
        prop_assert_eq!(
            a == b,
            ContainerName::for_application(ia) == ContainerName::for_application(ib)
        );
        let image = ImageName::for_application(ia);
        let container = ContainerName::for_application(ib);
        prop_assert_ne!(image.as_str(), container.as_str());
    }

    #[test]
    fn valid_references_round_trip(
        owner in "[A-Za-z0-9][A-Za-z0-9_-]{0,20}",
        repo in "[A-Za-z0-9][A-Za-z0-9_-]{0,20}",
    ) {
        let parsed = RepoRef::parse(&format!("https://github.com/{owner}/{repo}")).unwrap();
        prop_assert_eq!(parsed.owner(), owner.as_str());
        prop_assert_eq!(parsed.repo(), repo.as_str());
        prop_assert_eq!(
            RepoRef::parse(&parsed.clone_url()).unwrap(),
            parsed
        );
    }
}
