// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cluster membership against a simulated cluster

use crate::common::{FakeLxd, CERTIFICATE, PASSWORD};
use lxd_reconciler::cluster_member::{
    ClusterMemberReconciler, ClusterMemberSpec,
};
use lxd_reconciler::converge::{converge_cluster_member, Ensure, Outcome};
use lxd_reconciler::{Error, LxdApi, Operation};
use lxd_test_utils::dev::test_setup_log;
use lxd_types::cluster::MemberStatus;
use lxd_utils::fakes;

const FIRST: &str = "192.168.0.10:8443";

fn spec(name: &str, address: &str) -> ClusterMemberSpec {
    ClusterMemberSpec {
        name: name.to_string(),
        ensure: Ensure::Present,
        enabled: Some(true),
        cluster_password: Some(PASSWORD.to_string()),
        address: address.to_string(),
        join_member: FIRST.to_string(),
        other_members: vec![],
    }
}

fn converge(
    api: &LxdApi,
    certificates: &fakes::certificate::PeerCertificate,
    spec: &ClusterMemberSpec,
) -> Result<Outcome, Error> {
    let member = ClusterMemberReconciler::new(api, certificates, spec);
    converge_cluster_member(&member)
}

#[test]
fn test_member_lifecycle() {
    let logctx = test_setup_log("test_member_lifecycle");
    let lxd = FakeLxd::new();
    let certificates = fakes::certificate::PeerCertificate::new(CERTIFICATE);
    let mut specs = vec![
        spec("member01", FIRST),
        spec("member02", "192.168.0.11:8443"),
        spec("member03", "192.168.0.12:8443"),
    ];
    let apis: Vec<_> =
        specs.iter().map(|s| lxd.api(&s.name, &logctx.log)).collect();

    for (api, spec) in apis.iter().zip(&specs) {
        assert_eq!(
            converge(api, &certificates, spec).unwrap(),
            Outcome::Created
        );
    }
    assert_eq!(lxd.members().len(), 3);
    // Only joining members fetch the certificate of the member they join.
    assert_eq!(certificates.requests(), vec![FIRST, FIRST]);

    for (api, spec) in apis.iter().zip(&specs) {
        assert_eq!(
            converge(api, &certificates, spec).unwrap(),
            Outcome::Unchanged
        );
    }

    specs[1].enabled = Some(false);
    assert_eq!(
        converge(&apis[1], &certificates, &specs[1]).unwrap(),
        Outcome::Updated(vec!["enabled"])
    );
    assert_eq!(lxd.members()["member02"], MemberStatus::Evacuated);
    assert_eq!(
        converge(&apis[1], &certificates, &specs[1]).unwrap(),
        Outcome::Unchanged
    );

    for i in [2, 1] {
        specs[i].ensure = Ensure::Absent;
        assert_eq!(
            converge(&apis[i], &certificates, &specs[i]).unwrap(),
            Outcome::Destroyed
        );
        assert_eq!(
            converge(&apis[i], &certificates, &specs[i]).unwrap(),
            Outcome::Unchanged
        );
    }
    assert_eq!(lxd.members().keys().collect::<Vec<_>>(), ["member01"]);

    // The last member stays: LXD cannot remove it.
    specs[0].ensure = Ensure::Absent;
    assert_eq!(
        converge(&apis[0], &certificates, &specs[0]).unwrap(),
        Outcome::Unchanged
    );
    assert_eq!(lxd.members().len(), 1);

    logctx.cleanup_successful();
}

#[test]
fn test_lone_member_absent_is_unchanged() {
    let logctx = test_setup_log("test_lone_member_absent_is_unchanged");
    let lxd = FakeLxd::new();
    let certificates = fakes::certificate::PeerCertificate::new(CERTIFICATE);
    let mut first = spec("member01", FIRST);
    let api = lxd.api("member01", &logctx.log);

    assert_eq!(
        converge(&api, &certificates, &first).unwrap(),
        Outcome::Created
    );
    first.ensure = Ensure::Absent;
    for _ in 0..2 {
        assert_eq!(
            converge(&api, &certificates, &first).unwrap(),
            Outcome::Unchanged
        );
        assert_eq!(lxd.members().len(), 1);
    }

    logctx.cleanup_successful();
}

#[test]
fn test_join_with_wrong_password() {
    let logctx = test_setup_log("test_join_with_wrong_password");
    let lxd = FakeLxd::new();
    let certificates = fakes::certificate::PeerCertificate::new(CERTIFICATE);
    let first = spec("member01", FIRST);
    let mut second = spec("member02", "192.168.0.11:8443");
    second.cluster_password = Some("guess".to_string());

    converge(&lxd.api("member01", &logctx.log), &certificates, &first)
        .unwrap();
    let err =
        converge(&lxd.api("member02", &logctx.log), &certificates, &second)
            .unwrap_err();
    match err {
        Error::Convergence { operation, raw } => {
            assert_eq!(operation, Operation::ClusterJoin);
            assert!(raw.contains("Invalid cluster password"), "{raw}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(lxd.members().len(), 1);

    logctx.cleanup_successful();
}
