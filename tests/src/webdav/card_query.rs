/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use dav_report::storage::CollectionKind;
use hyper::StatusCode;

use super::{
    MemoryStorage, ReportTest, TEST_VCARD_2, addressbook_storage, calendar_storage,
};

const STATUS: &str = "D:multistatus.D:response.D:propstat.D:status";

pub async fn test() {
    println!("Running addressbook-query tests...");
    let test = ReportTest::new(addressbook_storage());

    for (filter, expected_hrefs) in [
        // Empty combinators
        ("<C:filter/>", vec![]),
        ("<C:filter test=\"anyof\"/>", vec![]),
        (
            "<C:filter test=\"allof\"/>",
            vec![
                "/john/contacts/wile.vcf",
                "/john/contacts/joe.vcf",
                "/john/contacts/jane.vcf",
            ],
        ),
        // A failing member excludes the item under allof
        (
            concat!(
                "<C:filter test=\"allof\">",
                "<C:prop-filter name=\"NICKNAME\"/>",
                "<C:prop-filter name=\"FN\">",
                "<C:text-match>wile</C:text-match>",
                "</C:prop-filter>",
                "</C:filter>"
            ),
            vec![],
        ),
        (
            concat!(
                "<C:filter test=\"anyof\">",
                "<C:prop-filter name=\"NICKNAME\"/>",
                "<C:prop-filter name=\"FN\">",
                "<C:text-match>doe</C:text-match>",
                "</C:prop-filter>",
                "</C:filter>"
            ),
            vec!["/john/contacts/joe.vcf", "/john/contacts/jane.vcf"],
        ),
        (
            concat!(
                "<C:filter>",
                "<C:prop-filter name=\"EMAIL\">",
                "<C:param-filter name=\"X-LABEL\">",
                "<C:text-match match-type=\"equals\">office</C:text-match>",
                "</C:param-filter>",
                "</C:prop-filter>",
                "</C:filter>"
            ),
            vec!["/john/contacts/wile.vcf"],
        ),
        (
            concat!(
                "<C:filter>",
                "<C:prop-filter name=\"item1.EMAIL\"/>",
                "</C:filter>"
            ),
            vec!["/john/contacts/jane.vcf"],
        ),
        (
            concat!(
                "<C:filter>",
                "<C:prop-filter name=\"TEL\"><C:is-not-defined/></C:prop-filter>",
                "</C:filter>"
            ),
            vec!["/john/contacts/wile.vcf", "/john/contacts/joe.vcf"],
        ),
        (
            concat!(
                "<C:filter>",
                "<C:prop-filter name=\"EMAIL\">",
                "<C:text-match match-type=\"ends-with\">.COM</C:text-match>",
                "</C:prop-filter>",
                "</C:filter>"
            ),
            vec!["/john/contacts/wile.vcf", "/john/contacts/joe.vcf"],
        ),
        (
            concat!(
                "<C:filter>",
                "<C:prop-filter name=\"FN\">",
                "<C:text-match negate-condition=\"yes\" match-type=\"starts-with\">jane</C:text-match>",
                "</C:prop-filter>",
                "</C:filter>"
            ),
            vec!["/john/contacts/wile.vcf", "/john/contacts/joe.vcf"],
        ),
        (
            concat!(
                "<C:filter>",
                "<C:prop-filter name=\"EMAIL\">",
                "<C:param-filter name=\"TYPE\"/>",
                "</C:prop-filter>",
                "</C:filter>"
            ),
            vec![
                "/john/contacts/wile.vcf",
                "/john/contacts/joe.vcf",
                "/john/contacts/jane.vcf",
            ],
        ),
    ] {
        test.report("/john/contacts/", query("<D:getetag/>", filter, ""))
            .await
            .with_status(StatusCode::MULTI_STATUS)
            .with_hrefs(expected_hrefs);
    }

    // Properties of matching cards
    test.report(
        "/john/contacts/",
        query(
            "<D:getetag/><D:getcontenttype/><C:address-data/>",
            concat!(
                "<C:filter>",
                "<C:prop-filter name=\"NICKNAME\">",
                "<C:text-match match-type=\"equals\">HUMAN_BEING</C:text-match>",
                "</C:prop-filter>",
                "</C:filter>"
            ),
            "",
        ),
    )
    .await
    .with_status(StatusCode::MULTI_STATUS)
    .with_hrefs(["/john/contacts/joe.vcf"])
    .with_values(STATUS, ["HTTP/1.1 200 OK"])
    .with_value(
        "D:multistatus.D:response.D:propstat.D:prop.D:getetag",
        "\"c2\"",
    )
    .with_value(
        "D:multistatus.D:response.D:propstat.D:prop.D:getcontenttype",
        "text/vcard;charset=UTF-8",
    )
    .with_value(
        "D:multistatus.D:response.D:propstat.D:prop.B:address-data",
        TEST_VCARD_2,
    );

    // Result limits
    for (limit, expected_hrefs) in [
        (1, vec!["/john/contacts/wile.vcf"]),
        (2, vec!["/john/contacts/wile.vcf", "/john/contacts/joe.vcf"]),
        (
            10,
            vec![
                "/john/contacts/wile.vcf",
                "/john/contacts/joe.vcf",
                "/john/contacts/jane.vcf",
            ],
        ),
    ] {
        test.report(
            "/john/contacts/",
            query(
                "<D:getetag/>",
                "<C:filter test=\"allof\"/>",
                &format!("<C:limit><C:nresults>{limit}</C:nresults></C:limit>"),
            ),
        )
        .await
        .with_status(StatusCode::MULTI_STATUS)
        .with_hrefs(expected_hrefs);
    }

    // Invalid filters fail the request even when evaluation could stop early
    for (filter, reason) in [
        (
            concat!(
                "<C:filter test=\"allof\">",
                "<C:prop-filter name=\"NICKNAME\"/>",
                "<C:prop-filter name=\"FN\">",
                "<C:text-match collation=\"i;klingon\">joe</C:text-match>",
                "</C:prop-filter>",
                "</C:filter>"
            ),
            "collation i;klingon",
        ),
        (
            concat!(
                "<C:filter test=\"anyof\">",
                "<C:prop-filter name=\"FN\"/>",
                "<C:prop-filter name=\"EMAIL\" test=\"xor\"/>",
                "</C:filter>"
            ),
            "Unsupported filter test: \"xor\"",
        ),
        (
            "<C:filter><C:comp-filter name=\"VCARD\"/></C:filter>",
            "Unexpected <B:comp-filter> in filter",
        ),
    ] {
        test.report("/john/contacts/", query("<D:getetag/>", filter, ""))
            .await
            .with_status(StatusCode::BAD_REQUEST)
            .with_body_containing(reason);
    }

    // Empty address books still reject invalid filters
    ReportTest::new(MemoryStorage::new().with_collection(
        "john/empty",
        Some(CollectionKind::AddressBook),
        [],
    ))
    .report(
        "/john/empty/",
        query(
            "<D:getetag/>",
            "<C:filter><C:comp-filter name=\"VCARD\"/></C:filter>",
            "",
        ),
    )
    .await
    .with_status(StatusCode::BAD_REQUEST)
    .with_body_containing("Unexpected <B:comp-filter> in filter");

    // Card filters only apply to address books
    ReportTest::new(calendar_storage())
        .report(
            "/john/calendar/",
            query("<D:getetag/>", "<C:filter test=\"allof\"/>", ""),
        )
        .await
        .with_status(StatusCode::BAD_REQUEST)
        .with_body_containing(
            "Unsupported filter \"{urn:ietf:params:xml:ns:carddav}filter\" for \"VCALENDAR\"",
        );
}

fn query(props: &str, filter: &str, limit: &str) -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"utf-8\" ?>",
            "<C:addressbook-query xmlns:D=\"DAV:\" xmlns:C=\"urn:ietf:params:xml:ns:carddav\">",
            "<D:prop>{}</D:prop>",
            "{}{}",
            "</C:addressbook-query>"
        ),
        props, filter, limit
    )
}
