use std::fmt::Write as _;

use crate::eligibility::Rule;

use super::Tables;

const PIVOTS: [(&str, &str); 4] = [
    ("store_rank", "int_value"),
    ("brisque_score", "float_value"),
    ("syn_con_image_selection", "int_value"),
    ("hero_category", "string_value"),
];

fn generate_ids(out: &mut String, attributes: &str) -> std::fmt::Result {
    writeln!(out, "ids AS (")?;
    writeln!(out, "  SELECT")?;
    writeln!(out, "    a.alle_ingestion_id,")?;
    writeln!(out, "    MAX(a.updated_at) AS latest_attr_ts,")?;
    writeln!(out, "    MAX(a.string_value) AS ingestion_query")?;
    writeln!(out, "  FROM {attributes} a")?;
    writeln!(out, "  WHERE a.type = 'ingestion_query'")?;
    writeln!(out, "  GROUP BY a.alle_ingestion_id")?;
    writeln!(out, ")")?;
    Ok(())
}

fn generate_latest_img(out: &mut String, images: &str) -> std::fmt::Result {
    writeln!(out, "latest_img AS (")?;
    writeln!(out, "  SELECT")?;
    writeln!(out, "    ai.alle_ingestion_id,")?;
    writeln!(out, "    MAX(ai.updated_at) AS updated_at")?;
    writeln!(out, "  FROM {images} ai")?;
    writeln!(out, "  GROUP BY ai.alle_ingestion_id")?;
    writeln!(out, ")")?;
    Ok(())
}

// Snapshots sharing the latest timestamp resolve to the smallest media key.
fn generate_pick(out: &mut String, images: &str) -> std::fmt::Result {
    writeln!(out, "pick AS (")?;
    writeln!(out, "  SELECT")?;
    writeln!(out, "    li.alle_ingestion_id,")?;
    writeln!(out, "    li.updated_at,")?;
    writeln!(out, "    MIN(ai.alle_media_key) AS alle_media_key")?;
    writeln!(out, "  FROM latest_img li")?;
    writeln!(out, "  JOIN {images} ai")?;
    writeln!(out, "    ON ai.alle_ingestion_id = li.alle_ingestion_id")?;
    writeln!(out, "   AND ai.updated_at = li.updated_at")?;
    writeln!(out, "  GROUP BY li.alle_ingestion_id, li.updated_at")?;
    writeln!(out, ")")?;
    Ok(())
}

fn generate_snap(out: &mut String, images: &str, attributes: &str) -> std::fmt::Result {
    writeln!(out, "snap AS (")?;
    writeln!(out, "  SELECT")?;
    writeln!(out, "    i.alle_ingestion_id AS alle_ingestion_id,")?;
    writeln!(out, "    ai.alle_media_key AS alle_media_key,")?;
    writeln!(out, "    MAX(ai.aspect_ratio) AS aspect_ratio,")?;
    writeln!(out, "    p.updated_at,")?;
    for (column, value) in PIVOTS {
        writeln!(
            out,
            "    MAX(CASE WHEN a2.type = '{column}' THEN a2.{value} END) AS {column},"
        )?;
    }
    writeln!(out, "    i.ingestion_query AS ingestion_query")?;
    writeln!(out, "  FROM ids i")?;
    writeln!(out, "  JOIN pick p")?;
    writeln!(out, "    ON p.alle_ingestion_id = i.alle_ingestion_id")?;
    writeln!(out, "  JOIN {images} ai")?;
    writeln!(out, "    ON ai.alle_ingestion_id = p.alle_ingestion_id")?;
    writeln!(out, "   AND ai.alle_media_key = p.alle_media_key")?;
    writeln!(out, "   AND ai.updated_at = p.updated_at")?;
    writeln!(out, "  LEFT JOIN {attributes} a2")?;
    writeln!(out, "    ON a2.alle_ingestion_id = i.alle_ingestion_id")?;
    writeln!(
        out,
        "  GROUP BY i.alle_ingestion_id, ai.alle_media_key, p.updated_at, i.ingestion_query"
    )?;
    writeln!(out, ")")?;
    Ok(())
}

pub fn generate(out: &mut String, tables: &Tables, rule: &Rule) -> std::fmt::Result {
    let images = tables.images();
    let attributes = tables.attributes();
    writeln!(out, "WITH")?;
    generate_ids(out, &attributes)?;
    write!(out, ", ")?;
    generate_latest_img(out, &images)?;
    write!(out, ", ")?;
    generate_pick(out, &images)?;
    write!(out, ", ")?;
    generate_snap(out, &images, &attributes)?;
    writeln!(out, "SELECT")?;
    for column in [
        "alle_ingestion_id",
        "alle_media_key",
        "ingestion_query",
        "store_rank",
        "syn_con_image_selection",
        "brisque_score",
        "hero_category",
        "aspect_ratio",
    ] {
        writeln!(out, "  s.{column} AS {column},")?;
    }
    writeln!(out, "  {} AS eligible", rule.sql_case("s"))?;
    writeln!(out, "FROM snap s")?;
    writeln!(out, "ORDER BY s.alle_ingestion_id")?;
    Ok(())
}
